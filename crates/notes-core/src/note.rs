//! # Note Record
//!
//! The sole domain entity. Fields are private so the lifecycle rules hold
//! by construction:
//!
//! - `id`, `owner`, and `created_at` are fixed when the note is created.
//! - Only `title` and `content` change, and only through [`NotePatch`].
//! - Every applied patch advances `updated_at` strictly.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::identity::{NoteId, Principal};
use crate::temporal;

/// Maximum title length in Unicode code points.
pub const TITLE_MAX_CHARS: usize = 200;

/// Length of the short title used in log lines and admin listings.
const DISPLAY_TITLE_CHARS: usize = 50;

const TITLE_FIELD: &str = "title";

/// Trim and validate a title, returning the value to store.
fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            TITLE_FIELD,
            "This field may not be blank.",
        ));
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationError::new(
            TITLE_FIELD,
            format!("Ensure this field has no more than {TITLE_MAX_CHARS} characters."),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validated input for creating a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Validate creation input. `title` is required; `content` defaults to
    /// the empty string.
    pub fn new(title: Option<String>, content: Option<String>) -> Result<Self, ValidationError> {
        let title = match title {
            Some(t) => validate_title(&t)?,
            None => {
                return Err(ValidationError::new(
                    TITLE_FIELD,
                    "This field is required.",
                ))
            }
        };
        Ok(Self {
            title,
            content: content.unwrap_or_default(),
        })
    }

    /// The validated title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The content.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Validated partial update. Only `title` and `content` are mutable;
/// absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    title: Option<String>,
    content: Option<String>,
}

impl NotePatch {
    /// Validate update input. A present `title` is re-validated.
    pub fn new(title: Option<String>, content: Option<String>) -> Result<Self, ValidationError> {
        let title = title.as_deref().map(validate_title).transpose()?;
        Ok(Self { title, content })
    }

    /// The new title, if one was supplied.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The new content, if supplied.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Whether the patch carries no field changes.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// A note owned by exactly one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    id: NoteId,
    title: String,
    content: String,
    owner: Principal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a new note owned by `owner`. Both timestamps are set to now.
    pub fn create(owner: Principal, draft: NoteDraft) -> Self {
        let now = temporal::now();
        Self {
            id: NoteId::new(),
            title: draft.title,
            content: draft.content,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a note from persisted columns.
    ///
    /// Returns `None` if the row violates `updated_at >= created_at`.
    pub fn from_parts(
        id: NoteId,
        title: String,
        content: String,
        owner: Principal,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Option<Self> {
        if updated_at < created_at {
            return None;
        }
        Some(Self {
            id,
            title,
            content,
            owner,
            created_at,
            updated_at,
        })
    }

    /// The single ownership predicate. Every read and mutation path must
    /// pass through this check.
    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        &self.owner == principal
    }

    /// Apply a validated patch and advance `updated_at`, even when no field
    /// value actually changes.
    pub fn apply(&mut self, patch: &NotePatch) {
        if let Some(title) = patch.title() {
            self.title = title.to_string();
        }
        if let Some(content) = patch.content() {
            self.content = content.to_string();
        }
        self.updated_at = temporal::advance(self.updated_at);
    }

    /// Title truncated to 50 code points.
    pub fn display_title(&self) -> String {
        self.title.chars().take(DISPLAY_TITLE_CHARS).collect()
    }

    /// Note identifier.
    pub fn id(&self) -> NoteId {
        self.id
    }

    /// Title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Owning principal.
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last mutation time.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
