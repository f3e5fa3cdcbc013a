//! # Pagination Cursors
//!
//! A cursor is an opaque token naming a position in an ordered sequence,
//! not a row offset. Clients must treat it as opaque.
//!
//! ## Wire Format (version 1)
//!
//! base64url without padding over a JSON object:
//!
//! ```text
//! {"v":1,"ord":"-updated_at","dir":"next","key":"2026-01-15T12:00:00.000000Z","id":"<uuid>"}
//! ```
//!
//! - `ord` names the ordering the cursor was minted under; a cursor is only
//!   valid for that ordering.
//! - `key` is the sort-key value: RFC 3339 with microseconds for timestamp
//!   fields, the raw string for text fields.
//! - `dir` is `next` (items strictly after the position), `prev` (items
//!   strictly before it) or `through` (items up to and including it).
//!
//! The version is checked before anything else so later formats can add
//! fields or orderings without misreading older tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::identity::NoteId;
use crate::ordering::{OrderField, Ordering, Position, SortKey};
use crate::temporal;

/// Current cursor format version.
const CURSOR_VERSION: u32 = 1;

/// Upper bound on accepted token length.
const MAX_TOKEN_LEN: usize = 4096;

/// Which side of the position a cursor pages toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    /// Items strictly after the position.
    Next,
    /// Items strictly before the position.
    Prev,
    /// Items up to and including the position. Minted when a `next` window
    /// ran past the end, so paging back still reaches the last item seen.
    Through,
}

/// A decoded pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// The ordering this cursor was minted under.
    pub ordering: Ordering,
    /// Paging direction.
    pub direction: CursorDirection,
    /// Position in the ordered sequence.
    pub position: Position,
}

#[derive(Serialize, Deserialize)]
struct CursorWire {
    v: u32,
    ord: String,
    dir: CursorDirection,
    key: String,
    id: NoteId,
}

impl Cursor {
    /// Encode to an opaque token.
    pub fn encode(&self) -> String {
        let key = match &self.position.key {
            SortKey::Timestamp(ts) => temporal::to_canonical_string(ts),
            SortKey::Text(s) => s.clone(),
        };
        let wire = CursorWire {
            v: CURSOR_VERSION,
            ord: self.ordering.as_param(),
            dir: self.direction,
            key,
            id: self.position.id,
        };
        // Serializing a struct of strings and a UUID cannot fail.
        let json = serde_json::to_vec(&wire).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token and check it was minted for `expected`.
    pub fn decode(token: &str, expected: &Ordering) -> Result<Self, QueryError> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(QueryError::InvalidCursor("token length out of range".into()));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| QueryError::InvalidCursor("not base64url".into()))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|_| QueryError::InvalidCursor("not a cursor payload".into()))?;

        let version = value
            .get("v")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| QueryError::InvalidCursor("missing version".into()))?;
        if version != u64::from(CURSOR_VERSION) {
            return Err(QueryError::UnsupportedCursorVersion(
                u32::try_from(version).unwrap_or(u32::MAX),
            ));
        }

        let wire: CursorWire = serde_json::from_value(value)
            .map_err(|e| QueryError::InvalidCursor(format!("malformed payload: {e}")))?;

        let ordering = Ordering::parse(Some(&wire.ord))
            .map_err(|_| QueryError::InvalidCursor(format!("unknown ordering \"{}\"", wire.ord)))?;
        if ordering != *expected {
            return Err(QueryError::CursorOrderingMismatch {
                cursor: ordering.as_param(),
                requested: expected.as_param(),
            });
        }

        let key = match ordering.field {
            OrderField::CreatedAt | OrderField::UpdatedAt => temporal::parse(&wire.key)
                .map(SortKey::Timestamp)
                .ok_or_else(|| QueryError::InvalidCursor("bad timestamp key".into()))?,
            OrderField::Title => SortKey::Text(wire.key),
        };

        Ok(Self {
            ordering,
            direction: wire.dir,
            position: Position { key, id: wire.id },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ordering: Ordering, direction: CursorDirection) -> Cursor {
        let key = match ordering.field {
            OrderField::Title => SortKey::Text("Buy groceries".into()),
            _ => SortKey::Timestamp(temporal::now()),
        };
        Cursor {
            ordering,
            direction,
            position: Position {
                key,
                id: NoteId::new(),
            },
        }
    }

    #[test]
    fn token_is_url_safe() {
        let token = sample(Ordering::default(), CursorDirection::Next).encode();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn decodes_under_matching_ordering() {
        for field in OrderField::ALL {
            for descending in [false, true] {
                let ordering = Ordering { field, descending };
                let cursor = sample(ordering, CursorDirection::Prev);
                let decoded = Cursor::decode(&cursor.encode(), &ordering).unwrap();
                assert_eq!(decoded, cursor);
            }
        }
    }

    #[test]
    fn through_direction_survives_encoding() {
        let cursor = sample(Ordering::default(), CursorDirection::Through);
        let token = cursor.encode();
        let decoded = Cursor::decode(&token, &Ordering::default()).unwrap();
        assert_eq!(decoded.direction, CursorDirection::Through);
    }

    #[test]
    fn rejects_cursor_for_other_ordering() {
        let cursor = sample(Ordering::parse(Some("title")).unwrap(), CursorDirection::Next);
        let err = Cursor::decode(&cursor.encode(), &Ordering::default()).unwrap_err();
        assert!(matches!(err, QueryError::CursorOrderingMismatch { .. }));
    }

    #[test]
    fn rejects_garbage_tokens() {
        let ordering = Ordering::default();
        assert!(Cursor::decode("", &ordering).is_err());
        assert!(Cursor::decode("!!!", &ordering).is_err());
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(matches!(
            Cursor::decode(&not_json, &ordering),
            Err(QueryError::InvalidCursor(_))
        ));
        let long = "A".repeat(MAX_TOKEN_LEN + 1);
        assert!(Cursor::decode(&long, &ordering).is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let payload = serde_json::json!({
            "v": 2,
            "ord": "-updated_at",
            "dir": "next",
            "key": "2026-01-15T12:00:00.000000Z",
            "id": NoteId::new(),
        });
        let token = URL_SAFE_NO_PAD.encode(payload.to_string());
        assert_eq!(
            Cursor::decode(&token, &Ordering::default()),
            Err(QueryError::UnsupportedCursorVersion(2))
        );
    }

    #[test]
    fn rejects_bad_timestamp_key() {
        let payload = serde_json::json!({
            "v": 1,
            "ord": "-updated_at",
            "dir": "next",
            "key": "not-a-time",
            "id": NoteId::new(),
        });
        let token = URL_SAFE_NO_PAD.encode(payload.to_string());
        assert!(matches!(
            Cursor::decode(&token, &Ordering::default()),
            Err(QueryError::InvalidCursor(_))
        ));
    }
}
