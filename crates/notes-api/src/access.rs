//! # Owner-Scoped Access
//!
//! [`OwnedNotes`] is the only path from a handler to the note store. It
//! binds one authenticated principal and routes every read and mutation
//! through [`Note::is_owned_by`]. A note owned by someone else is reported
//! exactly like a missing one.
//!
//! ## Persistence
//!
//! With a database configured, creates are persisted before they become
//! visible. Updates and deletes are applied to the store first (check and
//! mutate under one lock), then persisted with an owner-scoped statement.
//! A write that errors or matches no row is rolled back in memory and
//! surfaces as a 500.

use notes_core::{
    paginate, Cursor, Note, NoteDraft, NoteId, NotePatch, Ordering, Page, Principal, QueryError,
};

use crate::error::AppError;
use crate::state::AppState;

/// Parsed list-query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Lowercased search terms. Every term must appear in the title or content.
    terms: Vec<String>,
    pub ordering: Ordering,
    pub cursor: Option<Cursor>,
}

impl ListQuery {
    /// Validate raw `search`, `ordering`, and `cursor` parameters.
    pub fn parse(
        search: Option<&str>,
        ordering: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Self, QueryError> {
        let ordering = Ordering::parse(ordering)?;
        let cursor = cursor
            .map(|token| Cursor::decode(token, &ordering))
            .transpose()?;
        let terms = search
            .map(|s| s.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default();
        Ok(Self {
            terms,
            ordering,
            cursor,
        })
    }

    /// Case-insensitive substring match on title or content.
    pub fn matches(&self, note: &Note) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let title = note.title().to_lowercase();
        let content = note.content().to_lowercase();
        self.terms
            .iter()
            .all(|term| title.contains(term.as_str()) || content.contains(term.as_str()))
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            ordering: Ordering::default(),
            cursor: None,
        }
    }
}

/// Note operations on behalf of one principal.
pub struct OwnedNotes<'a> {
    state: &'a AppState,
    principal: &'a Principal,
}

impl<'a> OwnedNotes<'a> {
    pub fn new(state: &'a AppState, principal: &'a Principal) -> Self {
        Self { state, principal }
    }

    fn owned(&self) -> impl Fn(&Note) -> bool + '_ {
        move |note| note.is_owned_by(self.principal)
    }

    /// One page of the caller's notes.
    pub fn list(&self, query: &ListQuery) -> Page {
        let owned = self.owned();
        let notes = self
            .state
            .notes
            .filter(|note| owned(note) && query.matches(note));
        paginate(
            notes,
            query.ordering,
            query.cursor.as_ref(),
            self.state.config.page_size,
        )
    }

    /// Create a note owned by the caller.
    pub async fn create(&self, draft: NoteDraft) -> Result<Note, AppError> {
        let note = Note::create(self.principal.clone(), draft);

        if let Some(pool) = &self.state.db_pool {
            if let Err(e) = crate::db::notes::insert(pool, &note).await {
                tracing::error!(note_id = %note.id(), error = %e, "failed to persist note");
                return Err(AppError::Internal("note persist failed".into()));
            }
        }

        self.state.notes.insert(note.id(), note.clone());
        tracing::info!(
            note_id = %note.id(),
            principal = %self.principal,
            title = %note.display_title(),
            "note created"
        );
        Ok(note)
    }

    /// Fetch one of the caller's notes.
    pub fn retrieve(&self, id: NoteId) -> Result<Note, AppError> {
        self.state
            .notes
            .get_if(&id, self.owned())
            .ok_or(AppError::NotFound)
    }

    /// Apply a patch to one of the caller's notes.
    pub async fn partial_update(&self, id: NoteId, patch: &NotePatch) -> Result<Note, AppError> {
        let (before, after) = self
            .state
            .notes
            .update_if(&id, self.owned(), |note| note.apply(patch))
            .ok_or(AppError::NotFound)?;

        if let Some(pool) = &self.state.db_pool {
            let outcome = crate::db::notes::update_owned(pool, &after).await;
            if let Err(reason) = require_row(outcome) {
                self.state.notes.restore_if_unchanged(id, &after, before);
                tracing::error!(note_id = %id, %reason, "failed to persist note update");
                return Err(AppError::Internal("note update persist failed".into()));
            }
        }

        tracing::info!(note_id = %id, principal = %self.principal, "note updated");
        Ok(after)
    }

    /// Permanently delete one of the caller's notes.
    pub async fn delete(&self, id: NoteId) -> Result<(), AppError> {
        let removed = self
            .state
            .notes
            .remove_if(&id, self.owned())
            .ok_or(AppError::NotFound)?;

        if let Some(pool) = &self.state.db_pool {
            let outcome = crate::db::notes::delete_owned(pool, id, self.principal).await;
            if let Err(reason) = require_row(outcome) {
                self.state.notes.restore_removed(id, removed);
                tracing::error!(note_id = %id, %reason, "failed to persist note delete");
                return Err(AppError::Internal("note delete persist failed".into()));
            }
        }

        tracing::info!(note_id = %id, principal = %self.principal, "note deleted");
        Ok(())
    }
}

/// An owner-scoped statement that matched no row left the database out of
/// step with the store, so it fails like a connection error.
fn require_row(outcome: Result<bool, sqlx::Error>) -> Result<(), String> {
    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => Err("no stored row matched id and owner".into()),
        Err(e) => Err(e.to_string()),
    }
}
