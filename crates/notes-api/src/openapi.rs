//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document.
//! Serves it at `/schema` and renders it with ReDoc at `/docs`.

use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the Bearer JWT security scheme to the OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from POST /auth/token, sent as `Authorization: Bearer <token>`.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notes API",
        description = "Personal notes with JWT authentication.\n\nEvery `/notes` endpoint is scoped to the authenticated caller: notes owned by other users are indistinguishable from missing ones. Lists are cursor-paginated; `next` and `previous` are opaque tokens.",
        license(name = "MIT")
    ),
    paths(
        // ── Notes ───────────────────────────────────────────────────────
        crate::routes::notes::list_notes,
        crate::routes::notes::create_note,
        crate::routes::notes::get_note,
        crate::routes::notes::update_note,
        crate::routes::notes::delete_note,
        // ── Auth ────────────────────────────────────────────────────────
        crate::routes::auth::obtain_token,
        crate::routes::auth::refresh_token,
        crate::routes::auth::verify_token,
    ),
    components(
        schemas(
            crate::routes::notes::CreateNoteRequest,
            crate::routes::notes::UpdateNoteRequest,
            crate::routes::notes::NoteResponse,
            crate::routes::notes::NotePageResponse,
            crate::routes::auth::TokenObtainRequest,
            crate::routes::auth::TokenPairResponse,
            crate::routes::auth::TokenRefreshRequest,
            crate::routes::auth::AccessTokenResponse,
            crate::routes::auth::TokenVerifyRequest,
            crate::routes::auth::TokenVerifyResponse,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "notes", description = "Owner-scoped notes"),
        (name = "auth", description = "JWT obtain, refresh, and verify"),
    )
)]
pub struct ApiDoc;

const REDOC_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Notes API</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
  </head>
  <body>
    <redoc spec-url="/schema"></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
  </body>
</html>
"#;

/// Build the documentation router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schema", get(schema_json))
        .route("/docs", get(docs_page))
}

/// GET /schema: The generated OpenAPI document.
async fn schema_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// GET /docs: ReDoc viewer for `/schema`.
async fn docs_page() -> Html<&'static str> {
    Html(REDOC_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_note_and_auth_paths() {
        let spec = ApiDoc::openapi();
        for path in [
            "/notes",
            "/notes/{id}",
            "/auth/token",
            "/auth/token/refresh",
            "/auth/token/verify",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn spec_declares_bearer_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components present");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn docs_page_points_at_schema() {
        assert!(REDOC_PAGE.contains(r#"spec-url="/schema""#));
    }
}
