//! # Authentication
//!
//! Identity provider and bearer middleware.
//!
//! ## Tokens
//!
//! HS256 JWTs carrying `sub` (the principal), `iat`, `exp`, `jti`, and a
//! `token_type` of `access` or `refresh`. Access tokens authorize API calls;
//! refresh tokens only mint new access tokens.
//!
//! ## Credentials
//!
//! The [`UserDirectory`] stores SHA-256 digests of `username \0 password`
//! and compares them in constant time. Lookups for unknown usernames still
//! perform a comparison so response timing does not reveal which accounts
//! exist.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use notes_core::{Principal, ValidationError};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Maximum bearer token length (8 KiB).
pub const MAX_TOKEN_LENGTH: usize = 8192;

// ── Errors ──────────────────────────────────────────────────────────────────

/// Why a request or credential check was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,

    #[error("Authorization header must use the Bearer scheme.")]
    InvalidScheme,

    #[error("Token exceeds the maximum allowed length.")]
    TokenTooLong,

    #[error("Token is invalid.")]
    InvalidToken,

    #[error("Token is expired.")]
    Expired,

    #[error("Token has wrong type.")]
    WrongTokenType,

    #[error("No active account found with the given credentials.")]
    InvalidCredentials,

    /// Token encoding failed. Server-side fault.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(msg) => Self::Internal(msg),
            other => Self::Unauthenticated(other.to_string()),
        }
    }
}

// ── Secret ──────────────────────────────────────────────────────────────────

/// HMAC signing secret. Zeroized on drop, redacted in `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct JwtSecret(Vec<u8>);

impl JwtSecret {
    /// Minimum accepted secret length in bytes.
    pub const MIN_LEN: usize = 32;

    /// Wrap configured secret bytes. Returns `None` if shorter than [`Self::MIN_LEN`].
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let mut bytes = bytes.into();
        if bytes.len() < Self::MIN_LEN {
            bytes.zeroize();
            return None;
        }
        Some(Self(bytes))
    }

    /// Generate a random per-process secret. Tokens die with the process.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; Self::MIN_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret([REDACTED])")
    }
}

// ── Claims ──────────────────────────────────────────────────────────────────

/// Access or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claim set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: TokenKind,
}

/// Access and refresh token issued together at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

// ── Issuer ──────────────────────────────────────────────────────────────────

/// Signs and verifies tokens. Cheap to clone.
#[derive(Clone)]
pub struct TokenIssuer {
    inner: Arc<IssuerInner>,
}

struct IssuerInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl_secs", &self.inner.access_ttl.num_seconds())
            .field("refresh_ttl_secs", &self.inner.refresh_ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer from a secret and token lifetimes.
    pub fn new(secret: &JwtSecret, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(IssuerInner {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                access_ttl,
                refresh_ttl,
            }),
        }
    }

    /// Issue an access/refresh pair for an authenticated principal.
    pub fn issue_pair(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(principal, TokenKind::Access)?,
            refresh: self.issue(principal, TokenKind::Refresh)?,
        })
    }

    /// Issue a single token of `kind`.
    pub fn issue(&self, principal: &Principal, kind: TokenKind) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.inner.access_ttl,
            TokenKind::Refresh => self.inner.refresh_ttl,
        };
        let now = Utc::now();
        let claims = Claims {
            sub: principal.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: kind,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.inner.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and expiry. Accepts either token kind.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(AuthError::TokenTooLong);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.inner.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken,
            }
        })?;
        Ok(data.claims)
    }

    /// Verify a token and require it to be of `kind`.
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Principal, AuthError> {
        let claims = self.verify(token)?;
        if claims.token_type != kind {
            return Err(AuthError::WrongTokenType);
        }
        Principal::new(claims.sub).map_err(|_| AuthError::InvalidToken)
    }

    /// Mint a fresh access token from a valid refresh token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let principal = self.verify_kind(refresh_token, TokenKind::Refresh)?;
        self.issue(&principal, TokenKind::Access)
    }

    /// Resolve an `Authorization` header value to the principal it names.
    pub fn authenticate_header(&self, value: Option<&str>) -> Result<Principal, AuthError> {
        let value = value.ok_or(AuthError::MissingCredentials)?;
        let token = value
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::InvalidScheme)?
            .trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        self.verify_kind(token, TokenKind::Access)
    }
}

// ── Credential Directory ────────────────────────────────────────────────────

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct PasswordDigest([u8; 32]);

fn password_digest(username: &str, password: &str) -> PasswordDigest {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    PasswordDigest(hasher.finalize().into())
}

/// Username to password-digest map used by the token endpoint.
#[derive(Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, PasswordDigest>,
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("users", &self.users.len())
            .finish()
    }
}

impl UserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user. The username must be a valid principal.
    pub fn add(&mut self, username: &str, password: &str) -> Result<(), ValidationError> {
        let principal = Principal::new(username)?;
        let digest = password_digest(principal.as_str(), password);
        self.users.insert(principal.into(), digest);
        Ok(())
    }

    /// Check credentials and return the matching principal.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let candidate = password_digest(username, password);
        let matched = match self.users.get(username) {
            Some(stored) => bool::from(candidate.0[..].ct_eq(&stored.0[..])),
            None => {
                let decoy = password_digest("", "");
                let _ = candidate.0[..].ct_eq(&decoy.0[..]);
                false
            }
        };
        if !matched {
            return Err(AuthError::InvalidCredentials);
        }
        Principal::new(username).map_err(|_| AuthError::InvalidCredentials)
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no users are registered.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller, injected by [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub principal: Principal,
}

/// Extracts the identity that the auth middleware injected into extensions.
/// Returns 401 if no identity is present.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated(AuthError::MissingCredentials.to_string()))
    }
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// Require a valid access token and inject the caller's identity.
///
/// The [`TokenIssuer`] is read from request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(issuer) = request.extensions().get::<TokenIssuer>().cloned() else {
        return AppError::Internal("token issuer not installed".into()).into_response();
    };

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match issuer.authenticate_header(header_value) {
        Ok(principal) => {
            request
                .extensions_mut()
                .insert(CallerIdentity { principal });
            next.run(request).await
        }
        Err(err) => {
            tracing::warn!(
                reason = %err,
                method = %request.method(),
                path = %request.uri().path(),
                "rejected unauthenticated request"
            );
            AppError::from(err).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            &JwtSecret::generate(),
            Duration::minutes(5),
            Duration::days(1),
        )
    }

    fn alice() -> Principal {
        Principal::new("alice").unwrap()
    }

    #[test]
    fn access_token_authenticates_header() {
        let issuer = issuer();
        let pair = issuer.issue_pair(&alice()).unwrap();
        let principal = issuer
            .authenticate_header(Some(&format!("Bearer {}", pair.access)))
            .unwrap();
        assert_eq!(principal, alice());
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let issuer = issuer();
        let pair = issuer.issue_pair(&alice()).unwrap();
        assert_eq!(
            issuer.authenticate_header(Some(&format!("Bearer {}", pair.refresh))),
            Err(AuthError::WrongTokenType)
        );
    }

    #[test]
    fn refresh_mints_access_and_rejects_access_input() {
        let issuer = issuer();
        let pair = issuer.issue_pair(&alice()).unwrap();
        let access = issuer.refresh(&pair.refresh).unwrap();
        assert_eq!(issuer.verify_kind(&access, TokenKind::Access).unwrap(), alice());
        assert_eq!(issuer.refresh(&pair.access), Err(AuthError::WrongTokenType));
    }

    #[test]
    fn tokens_carry_unique_jti() {
        let issuer = issuer();
        let a = issuer.verify(&issuer.issue(&alice(), TokenKind::Access).unwrap()).unwrap();
        let b = issuer.verify(&issuer.issue(&alice(), TokenKind::Access).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
        assert!(a.exp > a.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let token = issuer
            .sign(&Claims {
                sub: "alice".into(),
                iat: now - 600,
                exp: now - 300,
                jti: Uuid::new_v4().to_string(),
                token_type: TokenKind::Access,
            })
            .unwrap();
        assert_eq!(issuer.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = issuer().issue(&alice(), TokenKind::Access).unwrap();
        assert_eq!(issuer().verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn header_shape_errors() {
        let issuer = issuer();
        assert_eq!(issuer.authenticate_header(None), Err(AuthError::MissingCredentials));
        assert_eq!(
            issuer.authenticate_header(Some("Basic YWxpY2U6cHc=")),
            Err(AuthError::InvalidScheme)
        );
        assert_eq!(
            issuer.authenticate_header(Some("Bearer ")),
            Err(AuthError::MissingCredentials)
        );
        let huge = format!("Bearer {}", "a".repeat(MAX_TOKEN_LENGTH + 1));
        assert_eq!(issuer.authenticate_header(Some(&huge)), Err(AuthError::TokenTooLong));
        assert_eq!(
            issuer.authenticate_header(Some("Bearer not.a.jwt")),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn directory_checks_passwords() {
        let mut users = UserDirectory::new();
        users.add("alice", "wonderland").unwrap();
        assert_eq!(users.authenticate("alice", "wonderland").unwrap(), alice());
        assert_eq!(
            users.authenticate("alice", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            users.authenticate("mallory", "wonderland"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn directory_rejects_blank_username() {
        assert!(UserDirectory::new().add("  ", "pw").is_err());
    }

    #[test]
    fn secrets_are_redacted() {
        let secret = JwtSecret::new(vec![b'k'; 40]).unwrap();
        assert_eq!(format!("{secret:?}"), "JwtSecret([REDACTED])");
        let mut users = UserDirectory::new();
        users.add("alice", "wonderland").unwrap();
        assert!(!format!("{users:?}").contains("wonderland"));
    }

    #[test]
    fn short_secret_is_refused() {
        assert!(JwtSecret::new(b"short".to_vec()).is_none());
    }

    #[test]
    fn signing_error_maps_to_internal() {
        let err: AppError = AuthError::Signing("boom".into()).into();
        assert!(matches!(err, AppError::Internal(_)));
        let err: AppError = AuthError::Expired.into();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }
}
