//! HTTP API
//!
//! Route groups mirror the resources: `auth`, `courses`, `notes` and `ai`.
//! Every route except health, register, login and refresh needs a bearer
//! access token (see [`auth::AuthUser`]).

pub mod ai;
pub mod auth;
pub mod courses;
pub mod error;
pub mod notes;

use crate::config::Config;
use crate::ports::storage::StoragePort;
use crate::services::{NoteProcessor, TokenService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

pub use error::{ApiError, ApiResult};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StoragePort>,
    pub tokens: Arc<TokenService>,
    pub processor: Arc<NoteProcessor>,
    pub config: Arc<Config>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(health))
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/refresh/", post(auth::refresh))
        .route("/auth/profile/", get(auth::profile))
        .route("/auth/profile/update/", put(auth::update_profile))
        .route("/auth/logout/", post(auth::logout))
        .route(
            "/courses/",
            get(courses::list_courses).post(courses::create_course),
        )
        .route(
            "/courses/:id/",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/notes/", get(notes::list_notes).post(notes::create_note))
        .route("/notes/search/", post(notes::search_notes))
        .route(
            "/notes/:id/",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/:id/reprocess/", post(notes::reprocess_note))
        .route("/ai/upload-audio/", post(ai::upload_audio))
        .route("/ai/status/:note_id/", get(ai::processing_status))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .with_state(state)
}
