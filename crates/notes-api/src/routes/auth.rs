//! # Token Endpoints
//!
//! Unauthenticated endpoints of the identity provider.
//!
//! - `POST /auth/token`: exchange credentials for an access/refresh pair
//! - `POST /auth/token/refresh`: exchange a refresh token for an access token
//! - `POST /auth/token/verify`: check a token of either kind

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use notes_core::ValidationError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::TokenPair;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::new(field, "This field is required.")),
        Some(v) if v.is_empty() => Err(ValidationError::new(field, "This field may not be blank.")),
        Some(v) => Ok(v),
    }
}

// ── Request/Response DTOs ───────────────────────────────────────────

/// Login credentials.
#[derive(Deserialize, ToSchema)]
pub struct TokenObtainRequest {
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[schema(format = Password)]
    pub password: Option<String>,
}

impl std::fmt::Debug for TokenObtainRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenObtainRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Validated credentials.
pub struct Credentials {
    username: String,
    password: String,
}

impl Validate for TokenObtainRequest {
    type Validated = Credentials;

    fn validate(self) -> Result<Credentials, ValidationError> {
        Ok(Credentials {
            username: required("username", self.username)?,
            password: required("password", self.password)?,
        })
    }
}

/// Access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access: pair.access,
            refresh: pair.refresh,
        }
    }
}

/// Refresh token to exchange.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRefreshRequest {
    pub refresh: Option<String>,
}

impl Validate for TokenRefreshRequest {
    type Validated = String;

    fn validate(self) -> Result<String, ValidationError> {
        required("refresh", self.refresh)
    }
}

/// A freshly minted access token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// Token to check.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenVerifyRequest {
    pub token: Option<String>,
}

impl Validate for TokenVerifyRequest {
    type Validated = String;

    fn validate(self) -> Result<String, ValidationError> {
        required("token", self.token)
    }
}

/// Empty body returned for a valid token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenVerifyResponse {}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(obtain_token))
        .route("/auth/token/refresh", post(refresh_token))
        .route("/auth/token/verify", post(verify_token))
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /auth/token: Exchange credentials for a token pair.
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = TokenObtainRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPairResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
    ),
    security(()),
    tag = "auth"
)]
pub(crate) async fn obtain_token(
    State(state): State<AppState>,
    body: Result<Json<TokenObtainRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let creds = extract_validated_json(body)?;
    let principal = match state.users.authenticate(&creds.username, &creds.password) {
        Ok(p) => p,
        Err(err) => {
            tracing::warn!(username = %creds.username, reason = %err, "login rejected");
            return Err(err.into());
        }
    };
    let pair = state.tokens.issue_pair(&principal)?;
    tracing::info!(principal = %principal, "issued token pair");
    Ok(Json(pair.into()))
}

/// POST /auth/token/refresh: Mint a new access token.
#[utoipa::path(
    post,
    path = "/auth/token/refresh",
    request_body = TokenRefreshRequest,
    responses(
        (status = 200, description = "Access token issued", body = AccessTokenResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid or expired refresh token", body = crate::error::ErrorBody),
    ),
    security(()),
    tag = "auth"
)]
pub(crate) async fn refresh_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let refresh = extract_validated_json(body)?;
    let access = state.tokens.refresh(&refresh)?;
    Ok(Json(AccessTokenResponse { access }))
}

/// POST /auth/token/verify: Check that a token is valid and unexpired.
#[utoipa::path(
    post,
    path = "/auth/token/verify",
    request_body = TokenVerifyRequest,
    responses(
        (status = 200, description = "Token is valid", body = TokenVerifyResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 401, description = "Token is invalid or expired", body = crate::error::ErrorBody),
    ),
    security(()),
    tag = "auth"
)]
pub(crate) async fn verify_token(
    State(state): State<AppState>,
    body: Result<Json<TokenVerifyRequest>, JsonRejection>,
) -> Result<Json<TokenVerifyResponse>, AppError> {
    let token = extract_validated_json(body)?;
    state.tokens.verify(&token)?;
    Ok(Json(TokenVerifyResponse {}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obtain_request_debug_redacts_password() {
        let req = TokenObtainRequest {
            username: Some("alice".into()),
            password: Some("hunter2hunter2".into()),
        };
        let out = format!("{req:?}");
        assert!(out.contains("alice"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn missing_and_blank_fields_are_rejected() {
        let req = TokenObtainRequest {
            username: Some("alice".into()),
            password: None,
        };
        let err = req.validate().err().unwrap();
        assert_eq!(err.field, "password");
        assert_eq!(err.reason, "This field is required.");

        let req = TokenRefreshRequest {
            refresh: Some(String::new()),
        };
        assert_eq!(
            req.validate().unwrap_err().reason,
            "This field may not be blank."
        );
    }

    #[test]
    fn verify_response_is_empty_object() {
        let json = serde_json::to_string(&TokenVerifyResponse {}).unwrap();
        assert_eq!(json, "{}");
    }
}
