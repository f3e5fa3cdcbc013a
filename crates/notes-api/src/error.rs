//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every failure leaves the service in the same envelope:
//!
//! ```text
//! {"error": {"type": "NotFound", "detail": "Not found.", "status": 404}}
//! ```
//!
//! Internal error details are logged and never returned to clients.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use notes_core::{FieldErrors, QueryError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error kind: `ValidationError`, `AuthenticationError`, `NotFound`,
    /// `InvalidQuery`, or `InternalError`.
    #[serde(rename = "type")]
    pub kind: String,
    /// A field map (`{"title": ["..."]}`) for field-level validation
    /// failures, otherwise a message string.
    #[schema(value_type = Object)]
    pub detail: serde_json::Value,
    /// HTTP status code, repeated for clients that only see the body.
    pub status: u16,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// One or more fields failed validation (400).
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Request body could not be parsed (400, reported as a validation error).
    #[error("malformed request body: {0}")]
    BadRequest(String),

    /// Missing, invalid, or expired credentials (401).
    #[error("authentication failed: {0}")]
    Unauthenticated(String),

    /// Absent, or owned by someone else (404). The two are indistinguishable.
    #[error("not found")]
    NotFound,

    /// Unusable list-query parameters (400).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and error kind for this error.
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "ValidationError")
            }
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "AuthenticationError"),
            Self::NotFound => (StatusCode::NOT_FOUND, "NotFound"),
            Self::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "InvalidQuery"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        }
    }

    fn detail(&self) -> serde_json::Value {
        match self {
            Self::Validation(fields) => serde_json::json!(fields),
            Self::BadRequest(msg) | Self::Unauthenticated(msg) | Self::InvalidQuery(msg) => {
                serde_json::Value::String(msg.clone())
            }
            Self::NotFound => serde_json::Value::String("Not found.".into()),
            Self::Internal(_) => {
                serde_json::Value::String("A server error occurred.".into())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        if let Self::Internal(msg) = &self {
            tracing::error!(error = %msg, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                kind: kind.to_string(),
                detail: self.detail(),
                status: status.as_u16(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"api\""),
            );
        }
        response
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_field_errors())
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, axum::http::HeaderMap, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, headers, body)
    }

    #[test]
    fn status_and_kind_mapping() {
        let cases = [
            (AppError::Validation(FieldErrors::new()), 400, "ValidationError"),
            (AppError::BadRequest("x".into()), 400, "ValidationError"),
            (AppError::Unauthenticated("x".into()), 401, "AuthenticationError"),
            (AppError::NotFound, 404, "NotFound"),
            (AppError::InvalidQuery("x".into()), 400, "InvalidQuery"),
            (AppError::Internal("x".into()), 500, "InternalError"),
        ];
        for (err, status, kind) in cases {
            let (s, k) = err.status_and_kind();
            assert_eq!(s.as_u16(), status);
            assert_eq!(k, kind);
        }
    }

    #[tokio::test]
    async fn validation_error_carries_field_map() {
        let err: AppError = ValidationError::new("title", "This field may not be blank.").into();
        let (status, _, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.kind, "ValidationError");
        assert_eq!(body.error.status, 400);
        assert_eq!(
            body.error.detail,
            serde_json::json!({"title": ["This field may not be blank."]})
        );
    }

    #[tokio::test]
    async fn not_found_uses_fixed_detail() {
        let (status, _, body) = response_parts(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.detail, serde_json::json!("Not found."));
    }

    #[tokio::test]
    async fn query_error_maps_to_invalid_query() {
        let err: AppError = QueryError::InvalidOrdering("owner".into()).into();
        let (status, _, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.kind, "InvalidQuery");
        assert!(body.error.detail.as_str().unwrap().contains("owner"));
    }

    #[tokio::test]
    async fn unauthenticated_sets_www_authenticate() {
        let (status, headers, body) =
            response_parts(AppError::Unauthenticated("token expired".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error.kind, "AuthenticationError");
        assert!(headers.contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, _, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body.error.detail.as_str().unwrap();
        assert!(!detail.contains("db connection"), "internal detail leaked: {detail}");
    }

    #[test]
    fn validation_display_names_fields() {
        let err: AppError = ValidationError::new("title", "too long").into();
        let msg = err.to_string();
        assert!(msg.starts_with("validation failed"));
        assert!(msg.contains("title"));
    }
}
