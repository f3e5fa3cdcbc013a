//! Note persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `notes` table.
//! Update and delete statements are conditional on both `id` and `owner`,
//! mirroring the ownership predicate the in-memory store applies.

use chrono::{DateTime, Utc};
use notes_core::{Note, NoteId, Principal};
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a newly created note.
pub async fn insert(pool: &PgPool, note: &Note) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO notes (id, title, content, owner, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(*note.id().as_uuid())
    .bind(note.title())
    .bind(note.content())
    .bind(note.owner().as_str())
    .bind(note.created_at())
    .bind(note.updated_at())
    .execute(pool)
    .await?;

    Ok(())
}

/// Write the mutable fields of `note`, scoped to its owner.
///
/// The `updated_at` guard keeps an older write that arrives late from
/// overwriting a newer one. Returns whether a row changed.
pub async fn update_owned(pool: &PgPool, note: &Note) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notes SET title = $1, content = $2, updated_at = $3
         WHERE id = $4 AND owner = $5 AND updated_at < $3",
    )
    .bind(note.title())
    .bind(note.content())
    .bind(note.updated_at())
    .bind(*note.id().as_uuid())
    .bind(note.owner().as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a note, scoped to its owner. Returns whether a row was removed.
pub async fn delete_owned(
    pool: &PgPool,
    id: NoteId,
    owner: &Principal,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND owner = $2")
        .bind(*id.as_uuid())
        .bind(owner.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load every note for startup hydration.
///
/// Rows that violate domain invariants are skipped with a warning.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Note>, sqlx::Error> {
    let rows = sqlx::query_as::<_, NoteRow>(
        "SELECT id, title, content, owner, created_at, updated_at
         FROM notes ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(NoteRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct NoteRow {
    id: Uuid,
    title: String,
    content: String,
    owner: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl NoteRow {
    fn into_record(self) -> Option<Note> {
        let id = self.id;
        let owner = match Principal::new(self.owner) {
            Ok(owner) => owner,
            Err(e) => {
                tracing::warn!(note_id = %id, error = %e, "skipping note with invalid owner");
                return None;
            }
        };
        let note = Note::from_parts(
            NoteId::from_uuid(id),
            self.title,
            self.content,
            owner,
            self.created_at,
            self.updated_at,
        );
        if note.is_none() {
            tracing::warn!(note_id = %id, "skipping note with updated_at before created_at");
        }
        note
    }
}
