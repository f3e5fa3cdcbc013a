//! # Notes Resource
//!
//! Owner-scoped CRUD over notes. Every handler requires a bearer access
//! token and goes through [`OwnedNotes`].
//!
//! ## Endpoints
//!
//! - `GET /notes`: list the caller's notes (`search`, `ordering`, `cursor`)
//! - `POST /notes`: create a note
//! - `GET /notes/:id`: retrieve a note
//! - `PATCH /notes/:id`: partially update a note
//! - `DELETE /notes/:id`: delete a note

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use notes_core::{Note, NoteDraft, NotePatch, Page, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::access::{ListQuery, OwnedNotes};
use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_query, extract_validated_json, parse_note_id, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

/// Keeps an explicit `null` apart from an absent field: absent stays
/// `None` through `#[serde(default)]`, `null` becomes `Some(None)`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn not_null(field: &str, value: Option<Option<String>>) -> Result<Option<String>, ValidationError> {
    match value {
        Some(None) => Err(ValidationError::new(field, "This field may not be null.")),
        Some(v) => Ok(v),
        None => Ok(None),
    }
}

/// Request to create a note. Fields other than `title` and `content` are
/// ignored; the owner is always the caller.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    /// 1 to 200 characters after trimming.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, example = "Buy groceries")]
    pub title: Option<Option<String>>,
    /// Free text. Defaults to empty.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, example = "Milk, eggs")]
    pub content: Option<Option<String>>,
}

impl Validate for CreateNoteRequest {
    type Validated = NoteDraft;

    fn validate(self) -> Result<NoteDraft, ValidationError> {
        NoteDraft::new(
            not_null("title", self.title)?,
            not_null("content", self.content)?,
        )
    }
}

/// Partial update. Absent fields are left unchanged; `null` is rejected.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub content: Option<Option<String>>,
}

impl Validate for UpdateNoteRequest {
    type Validated = NotePatch;

    fn validate(self) -> Result<NotePatch, ValidationError> {
        NotePatch::new(
            not_null("title", self.title)?,
            not_null("content", self.content)?,
        )
    }
}

/// A note as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Username of the owner.
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: *note.id().as_uuid(),
            title: note.title().to_string(),
            content: note.content().to_string(),
            owner: note.owner().to_string(),
            created_at: note.created_at(),
            updated_at: note.updated_at(),
        }
    }
}

/// One page of notes with opaque cursors to the neighbouring pages.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotePageResponse {
    pub results: Vec<NoteResponse>,
    /// Cursor for the following page, or null on the last page.
    pub next: Option<String>,
    /// Cursor for the preceding page, or null on the first page.
    pub previous: Option<String>,
}

impl From<Page> for NotePageResponse {
    fn from(page: Page) -> Self {
        Self {
            results: page.results.into_iter().map(NoteResponse::from).collect(),
            next: page.next.map(|c| c.encode()),
            previous: page.previous.map(|c| c.encode()),
        }
    }
}

/// List query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotesParams {
    /// Whitespace-separated terms matched case-insensitively against title
    /// and content.
    pub search: Option<String>,
    /// One of `created_at`, `updated_at`, `title`, optionally prefixed with
    /// `-`. Defaults to `-updated_at`.
    pub ordering: Option<String>,
    /// Opaque token from a previous response's `next` or `previous`.
    pub cursor: Option<String>,
}

// ── Router ──────────────────────────────────────────────────────────

/// Build the notes router. Callers must layer authentication on top.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route(
            "/notes/:id",
            get(get_note).patch(update_note).delete(delete_note),
        )
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /notes: List the caller's notes.
#[utoipa::path(
    get,
    path = "/notes",
    params(ListNotesParams),
    responses(
        (status = 200, description = "Page of notes", body = NotePageResponse),
        (status = 400, description = "Invalid ordering or cursor", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub(crate) async fn list_notes(
    State(state): State<AppState>,
    caller: CallerIdentity,
    params: Result<Query<ListNotesParams>, QueryRejection>,
) -> Result<Json<NotePageResponse>, AppError> {
    let params = extract_query(params)?;
    let query = ListQuery::parse(
        params.search.as_deref(),
        params.ordering.as_deref(),
        params.cursor.as_deref(),
    )?;
    let page = OwnedNotes::new(&state, &caller.principal).list(&query);
    Ok(Json(page.into()))
}

/// POST /notes: Create a note owned by the caller.
#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub(crate) async fn create_note(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NoteResponse>), AppError> {
    let draft = extract_validated_json(body)?;
    let note = OwnedNotes::new(&state, &caller.principal)
        .create(draft)
        .await?;
    Ok((StatusCode::CREATED, Json(note.into())))
}

/// GET /notes/:id: Retrieve one of the caller's notes.
#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorBody),
        (status = 404, description = "Note not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub(crate) async fn get_note(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<NoteResponse>, AppError> {
    let id = parse_note_id(&id)?;
    let note = OwnedNotes::new(&state, &caller.principal).retrieve(id)?;
    Ok(Json(note.into()))
}

/// PATCH /notes/:id: Update title and/or content.
#[utoipa::path(
    patch,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated", body = NoteResponse),
        (status = 400, description = "Validation error", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorBody),
        (status = 404, description = "Note not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub(crate) async fn update_note(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    body: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<Json<NoteResponse>, AppError> {
    let id = parse_note_id(&id)?;
    let patch = extract_validated_json(body)?;
    let note = OwnedNotes::new(&state, &caller.principal)
        .partial_update(id, &patch)
        .await?;
    Ok(Json(note.into()))
}

/// DELETE /notes/:id: Permanently delete a note.
#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note ID")),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorBody),
        (status = 404, description = "Note not found", body = crate::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "notes"
)]
pub(crate) async fn delete_note(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_note_id(&id)?;
    OwnedNotes::new(&state, &caller.principal)
        .delete(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
