//! Note routes
//!
//! Creating a note with content, or changing its content, runs the text
//! pipeline inline. A pipeline failure there is logged and the note is
//! still returned (with status `failed`); only the explicit reprocess
//! route reports it as an error.

use crate::api::auth::AuthUser;
use crate::api::courses::owned_course;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::domain::models::{Note, ProcessingStatus};
use crate::error::AppError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TITLE_MAX_CHARS: usize = 200;
const QUERY_MAX_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct NoteListQuery {
    pub course_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(alias = "course")]
    pub course_id: i64,
    #[serde(default)]
    pub raw_content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    #[serde(default, alias = "course")]
    pub course_id: Option<i64>,
    pub raw_content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub course_id: Option<i64>,
}

/// Full note representation
#[derive(Debug, Serialize)]
pub struct NoteView {
    pub id: Option<i64>,
    pub title: String,
    pub course_id: i64,
    pub course_title: String,
    pub raw_content: String,
    pub key_points: Vec<String>,
    pub detailed_notes: String,
    pub audio_file_path: Option<String>,
    pub processing_status: ProcessingStatus,
    pub is_processed: bool,
    pub has_content: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NoteView {
    fn new(note: Note, course_title: String) -> Self {
        Self {
            is_processed: note.is_processed(),
            has_content: note.has_content(),
            id: note.id,
            title: note.title,
            course_id: note.course_id,
            course_title,
            raw_content: note.raw_content,
            key_points: note.key_points,
            detailed_notes: note.detailed_notes,
            audio_file_path: note.audio_file_path,
            processing_status: note.processing_status,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Listing representation
#[derive(Debug, Serialize)]
pub struct NoteSummary {
    pub id: Option<i64>,
    pub title: String,
    pub course_id: i64,
    pub course_title: String,
    pub processing_status: ProcessingStatus,
    pub is_processed: bool,
    pub updated_at: i64,
}

#[derive(Debug, Serialize)]
pub struct NoteListResponse {
    pub notes: Vec<NoteSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub notes: Vec<NoteSummary>,
    pub count: usize,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub note: NoteView,
    pub message: String,
}

fn validate_title(title: &str) -> ApiResult<String> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Note title must be between 1 and {} characters",
            TITLE_MAX_CHARS
        )));
    }
    Ok(title.to_string())
}

/// Load a note owned by `user_id`; other users' notes are reported missing
pub(crate) async fn owned_note(state: &AppState, user_id: i64, id: i64) -> ApiResult<Note> {
    state
        .storage
        .get_note(id)
        .await?
        .filter(|note| note.user_id == user_id)
        .ok_or_else(|| ApiError::not_found(format!("Note {}", id)))
}

/// A note may only be placed in one of its owner's courses
async fn ensure_course_owned(state: &AppState, user_id: i64, course_id: i64) -> ApiResult<String> {
    match owned_course(state, user_id, course_id).await {
        Ok(course) => Ok(course.title),
        Err(ApiError(AppError::NotFound(_))) => Err(ApiError::bad_request(
            "You can only add notes to your own courses",
        )),
        Err(e) => Err(e),
    }
}

async fn note_view(state: &AppState, note: Note) -> ApiResult<NoteView> {
    let course_title = state
        .storage
        .get_course(note.course_id)
        .await?
        .map(|course| course.title)
        .unwrap_or_default();
    Ok(NoteView::new(note, course_title))
}

async fn summaries(
    state: &AppState,
    user_id: i64,
    notes: Vec<Note>,
) -> ApiResult<Vec<NoteSummary>> {
    let titles: HashMap<i64, String> = state
        .storage
        .list_courses(user_id)
        .await?
        .into_iter()
        .filter_map(|course| course.id.map(|id| (id, course.title)))
        .collect();

    Ok(notes
        .into_iter()
        .map(|note| NoteSummary {
            is_processed: note.is_processed(),
            id: note.id,
            course_title: titles.get(&note.course_id).cloned().unwrap_or_default(),
            title: note.title,
            course_id: note.course_id,
            processing_status: note.processing_status,
            updated_at: note.updated_at,
        })
        .collect())
}

/// Run the text pipeline and return the stored note either way
async fn process_inline(state: &AppState, note_id: i64) -> ApiResult<Note> {
    if let Err(e) = state.processor.run_text_pipeline(note_id).await {
        log::warn!("AI processing failed for note {}: {}", note_id, e);
    }
    state
        .storage
        .get_note(note_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Note {}", note_id)))
}

/// GET /notes/?course_id=
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<NoteListQuery>,
) -> ApiResult<Json<NoteListResponse>> {
    let notes = state.storage.list_notes(auth.id, query.course_id).await?;
    let notes = summaries(&state, auth.id, notes).await?;
    Ok(Json(NoteListResponse {
        count: notes.len(),
        notes,
    }))
}

/// POST /notes/
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<NoteResponse>)> {
    let title = validate_title(&request.title)?;
    ensure_course_owned(&state, auth.id, request.course_id).await?;

    let mut note = Note::new(auth.id, request.course_id, title, request.raw_content);
    let id = state.storage.create_note(&note).await?;
    note.id = Some(id);
    log::info!("User {} created note {}", auth.id, id);

    if !note.raw_content.trim().is_empty() {
        note = process_inline(&state, id).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(NoteResponse {
            note: note_view(&state, note).await?,
            message: "Note created successfully".to_string(),
        }),
    ))
}

/// GET /notes/{id}/
pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<NoteView>> {
    let note = owned_note(&state, auth.id, id).await?;
    Ok(Json(note_view(&state, note).await?))
}

/// PUT /notes/{id}/
///
/// Partial update of title, course and raw content.
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateNoteRequest>,
) -> ApiResult<Json<NoteResponse>> {
    let mut note = owned_note(&state, auth.id, id).await?;

    if let Some(title) = request.title {
        note.title = validate_title(&title)?;
    }
    if let Some(course_id) = request.course_id {
        ensure_course_owned(&state, auth.id, course_id).await?;
        note.course_id = course_id;
    }
    let content_changed = match request.raw_content {
        Some(raw_content) if raw_content != note.raw_content => {
            note.raw_content = raw_content;
            true
        }
        _ => false,
    };

    note.touch();
    state.storage.update_note(&note).await?;

    if content_changed && !note.raw_content.trim().is_empty() {
        note = process_inline(&state, id).await?;
    }

    Ok(Json(NoteResponse {
        note: note_view(&state, note).await?,
        message: "Note updated successfully".to_string(),
    }))
}

/// DELETE /notes/{id}/
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    owned_note(&state, auth.id, id).await?;
    state.storage.delete_note(id).await?;
    log::info!("User {} deleted note {}", auth.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notes/{id}/reprocess/
pub async fn reprocess_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<NoteResponse>> {
    let note = owned_note(&state, auth.id, id).await?;
    if note.raw_content.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Cannot reprocess note without raw content",
        ));
    }

    let note = state.processor.run_text_pipeline(id).await?;
    Ok(Json(NoteResponse {
        note: note_view(&state, note).await?,
        message: "Note reprocessed successfully".to_string(),
    }))
}

/// POST /notes/search/
pub async fn search_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let query = request.query.trim().to_string();
    if query.is_empty() || query.chars().count() > QUERY_MAX_CHARS {
        return Err(ApiError::bad_request(format!(
            "Query must be between 1 and {} characters",
            QUERY_MAX_CHARS
        )));
    }

    let notes = state
        .storage
        .search_notes(auth.id, &query, request.course_id)
        .await?;
    let notes = summaries(&state, auth.id, notes).await?;
    Ok(Json(SearchResponse {
        count: notes.len(),
        notes,
        query,
    }))
}
