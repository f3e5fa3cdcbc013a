//! # Error Types
//!
//! Structured errors for note validation and list-query shaping, built with
//! `thiserror`. The API layer maps [`ValidationError`] to a field-level
//! 400 response and [`QueryError`] to an `InvalidQuery` 400 response.

use std::collections::BTreeMap;

use thiserror::Error;

/// Field name → list of human-readable reasons, serialized as the
/// `detail` of a validation failure.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A client-supplied value violated a field constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field `{field}`: {reason}")]
pub struct ValidationError {
    /// The offending field (e.g. `"title"`).
    pub field: String,
    /// Why the value was rejected.
    pub reason: String,
}

impl ValidationError {
    /// Create a validation error for `field`.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Render as a field map suitable for an error envelope.
    pub fn to_field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.insert(self.field.clone(), vec![self.reason.clone()]);
        errors
    }
}

/// Errors while interpreting list-query parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The `ordering` parameter named a field outside the allow-list or was
    /// otherwise malformed.
    #[error("invalid ordering \"{0}\" (allowed: created_at, updated_at, title, each optionally prefixed with '-')")]
    InvalidOrdering(String),

    /// The cursor token could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// The cursor was produced by a format version this build does not read.
    #[error("unsupported cursor version {0}")]
    UnsupportedCursorVersion(u32),

    /// The cursor was minted for a different ordering than the one requested.
    #[error("cursor was issued for ordering \"{cursor}\" but \"{requested}\" was requested")]
    CursorOrderingMismatch {
        /// Ordering recorded inside the cursor.
        cursor: String,
        /// Ordering requested alongside the cursor.
        requested: String,
    },
}
