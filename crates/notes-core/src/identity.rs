//! # Identity Newtypes
//!
//! [`NoteId`] is UUID-based and always valid by construction. [`Principal`]
//! is string-based and validated once when built, whether from a verified
//! token subject or from the credential directory.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum principal length, matching the usual username column width.
const PRINCIPAL_MAX_CHARS: usize = 150;

/// Unique, immutable identifier of a note.
///
/// `Ord` follows the UUID byte order and is used as the pagination
/// tiebreaker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new random note identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a note identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// The authenticated identity making a request.
///
/// Holds the identifier only, never credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Validate and wrap a principal identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("principal", "must not be empty"));
        }
        if trimmed.chars().count() > PRINCIPAL_MAX_CHARS {
            return Err(ValidationError::new(
                "principal",
                format!("must not exceed {PRINCIPAL_MAX_CHARS} characters"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the principal identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Principal {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

impl PartialEq<&str> for Principal {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
