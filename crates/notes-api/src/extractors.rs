//! # Custom Extractors & Validation
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and
//! `Result<Query<T>, QueryRejection>` so rejections land in the uniform
//! error envelope instead of axum's plain-text defaults.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use notes_core::{NoteId, ValidationError};

use crate::error::AppError;

/// Request DTOs that validate into a domain value.
pub trait Validate {
    /// The validated domain value.
    type Validated;

    /// Check business rules and convert.
    fn validate(self) -> Result<Self::Validated, ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T::Validated, AppError> {
    let value = extract_json(result)?;
    Ok(value.validate()?)
}

/// Extract query parameters, mapping rejections to [`AppError::InvalidQuery`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::InvalidQuery(err.body_text()))
}

/// Parse a path segment as a note id.
///
/// Malformed ids are reported as [`AppError::NotFound`], the same answer a
/// well-formed but unknown id gets.
pub fn parse_note_id(raw: &str) -> Result<NoteId, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}
