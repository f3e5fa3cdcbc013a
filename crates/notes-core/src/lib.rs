#![deny(missing_docs)]

//! # notes-core: Foundational Types for the Notes Service
//!
//! This crate defines the domain types every layer of the notes service
//! shares. It has no web or database dependencies (only `serde`,
//! `serde_json`, `thiserror`, `chrono`, `uuid`, and `base64`).
//!
//! ## Design Principles
//!
//! 1. **Newtype identifiers.** A [`NoteId`] cannot be passed where a
//!    [`Principal`] is expected, and a `Principal` is validated once at
//!    construction.
//!
//! 2. **One ownership predicate.** [`Note::is_owned_by`] is the only place
//!    that decides whether a principal may see or touch a note. Every read
//!    and mutation path in the API layer funnels through it.
//!
//! 3. **Explicit allow-lists.** Sortable fields live in [`OrderField`];
//!    mutable fields live in [`NotePatch`]. Nothing is discovered by
//!    reflection.
//!
//! 4. **Opaque, versioned cursors.** [`Cursor`] encodes a position in an
//!    ordered sequence (sort key + tiebreak id), never a row offset, so
//!    pages stay stable while other rows are inserted or deleted.

pub mod cursor;
pub mod error;
pub mod identity;
pub mod note;
pub mod ordering;
pub mod page;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use cursor::{Cursor, CursorDirection};
pub use error::{FieldErrors, QueryError, ValidationError};
pub use identity::{NoteId, Principal};
pub use note::{Note, NoteDraft, NotePatch, TITLE_MAX_CHARS};
pub use ordering::{OrderField, Ordering, Position, SortKey};
pub use page::{paginate, Page};
