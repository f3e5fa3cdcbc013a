//! # Ordering Allow-List
//!
//! List results may be ordered by exactly one of `created_at`, `updated_at`,
//! or `title`, optionally prefixed with `-` for descending order. The note
//! id breaks ties in the same direction as the primary field, giving a
//! total order that seek-based pagination depends on.

use std::cmp::Ordering as CmpOrdering;

use chrono::{DateTime, Utc};

use crate::error::QueryError;
use crate::identity::NoteId;
use crate::note::Note;

/// A sortable note field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    /// Creation time.
    CreatedAt,
    /// Last mutation time.
    UpdatedAt,
    /// Title, compared by code point.
    Title,
}

impl OrderField {
    /// Every sortable field, in documentation order.
    pub const ALL: [OrderField; 3] = [Self::CreatedAt, Self::UpdatedAt, Self::Title];

    /// Query-parameter name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

/// The value a note is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    /// A timestamp field.
    Timestamp(DateTime<Utc>),
    /// A text field.
    Text(String),
}

/// A point in an ordered sequence: the sort key plus the tiebreak id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Primary sort key value.
    pub key: SortKey,
    /// Tiebreaker.
    pub id: NoteId,
}

impl Position {
    /// Position of `note` under `field`.
    pub fn of(note: &Note, field: OrderField) -> Self {
        let key = match field {
            OrderField::CreatedAt => SortKey::Timestamp(note.created_at()),
            OrderField::UpdatedAt => SortKey::Timestamp(note.updated_at()),
            OrderField::Title => SortKey::Text(note.title().to_string()),
        };
        Self { key, id: note.id() }
    }
}

/// A validated ordering: one allow-listed field plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    /// Field sorted on.
    pub field: OrderField,
    /// Whether the sequence runs high-to-low.
    pub descending: bool,
}

impl Default for Ordering {
    /// Most recently updated first.
    fn default() -> Self {
        Self {
            field: OrderField::UpdatedAt,
            descending: true,
        }
    }
}

impl Ordering {
    /// Parse the `ordering` query parameter. `None` yields the default.
    pub fn parse(raw: Option<&str>) -> Result<Self, QueryError> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let trimmed = raw.trim();
        let (descending, name) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let field =
            OrderField::from_name(name).ok_or_else(|| QueryError::InvalidOrdering(raw.to_string()))?;
        Ok(Self { field, descending })
    }

    /// Render back to query-parameter form, e.g. `-updated_at`.
    pub fn as_param(&self) -> String {
        if self.descending {
            format!("-{}", self.field.as_str())
        } else {
            self.field.as_str().to_string()
        }
    }

    /// Compare two positions in display order.
    pub fn compare(&self, a: &Position, b: &Position) -> CmpOrdering {
        let natural = a.key.cmp(&b.key).then_with(|| a.id.cmp(&b.id));
        if self.descending {
            natural.reverse()
        } else {
            natural
        }
    }

    /// Sort notes into display order.
    pub fn sort(&self, notes: &mut [Note]) {
        notes.sort_by(|a, b| {
            self.compare(&Position::of(a, self.field), &Position::of(b, self.field))
        });
    }
}

impl std::fmt::Display for Ordering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_param())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Principal;
    use crate::note::NoteDraft;

    fn note(title: &str) -> Note {
        Note::create(
            Principal::new("alice").unwrap(),
            NoteDraft::new(Some(title.into()), None).unwrap(),
        )
    }

    #[test]
    fn default_is_updated_at_descending() {
        let o = Ordering::parse(None).unwrap();
        assert_eq!(o, Ordering::default());
        assert_eq!(o.as_param(), "-updated_at");
    }

    #[test]
    fn parses_every_allowed_field_both_directions() {
        for field in OrderField::ALL {
            let asc = Ordering::parse(Some(field.as_str())).unwrap();
            assert_eq!(asc.field, field);
            assert!(!asc.descending);

            let desc = Ordering::parse(Some(&format!("-{}", field.as_str()))).unwrap();
            assert_eq!(desc.field, field);
            assert!(desc.descending);
        }
    }

    #[test]
    fn rejects_fields_outside_allow_list() {
        for bad in ["owner", "id", "content", "", "-", "--title", "title,-created_at", "+title"] {
            assert!(
                matches!(Ordering::parse(Some(bad)), Err(QueryError::InvalidOrdering(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn title_sort_breaks_ties_by_id_in_same_direction() {
        let mut notes = vec![note("b"), note("a"), note("b"), note("a")];
        let asc = Ordering::parse(Some("title")).unwrap();
        asc.sort(&mut notes);
        let titles: Vec<&str> = notes.iter().map(|n| n.title()).collect();
        assert_eq!(titles, vec!["a", "a", "b", "b"]);
        assert!(notes[0].id() < notes[1].id());
        assert!(notes[2].id() < notes[3].id());

        let desc = Ordering::parse(Some("-title")).unwrap();
        desc.sort(&mut notes);
        let titles: Vec<&str> = notes.iter().map(|n| n.title()).collect();
        assert_eq!(titles, vec!["b", "b", "a", "a"]);
        assert!(notes[0].id() > notes[1].id());
    }

    #[test]
    fn display_matches_param() {
        let o = Ordering::parse(Some("created_at")).unwrap();
        assert_eq!(o.to_string(), "created_at");
    }
}
