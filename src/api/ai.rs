//! Audio upload and processing status routes

use crate::api::auth::AuthUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::notes::owned_note;
use crate::api::AppState;
use crate::domain::models::ProcessingStatus;
use crate::error::AppError;
use crate::ports::transcription::audio_format_from_name;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use std::path::{Path as FsPath, PathBuf};

const FALLBACK_FILE_NAME: &str = "recording.webm";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub note_id: i64,
    pub message: String,
    pub processing_status: ProcessingStatus,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub note_id: i64,
    pub processing_status: ProcessingStatus,
    pub is_processed: bool,
    pub has_content: bool,
}

struct AudioUpload {
    file_name: String,
    data: Vec<u8>,
}

/// Reduce a client-supplied file name to a safe single path component
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<media_root>/audio/audio_<note_id>_<name>`
fn upload_path(media_root: &FsPath, note_id: i64, file_name: &str) -> PathBuf {
    media_root
        .join("audio")
        .join(format!("audio_{}_{}", note_id, sanitize_file_name(file_name)))
}

/// POST /ai/upload-audio/
///
/// Multipart fields: `audio_file` (the recording) and `note_id`. The file is
/// stored under the media root, then the audio pipeline runs to completion
/// before the response is sent.
pub async fn upload_audio(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut audio: Option<AudioUpload> = None;
    let mut note_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio_file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
                let data = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read audio file: {}", e))
                })?;
                audio = Some(AudioUpload {
                    file_name,
                    data: data.to_vec(),
                });
            }
            Some("note_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read note_id: {}", e)))?;
                note_id = Some(text);
            }
            _ => {}
        }
    }

    let audio = audio
        .filter(|audio| !audio.data.is_empty())
        .ok_or_else(|| ApiError::bad_request("No audio file provided"))?;
    let note_id = note_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Note ID is required"))?;
    let note_id: i64 = note_id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Note ID must be an integer"))?;

    owned_note(&state, auth.id, note_id).await?;

    let path = upload_path(&state.config.media_root, note_id, &audio.file_name);
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(AppError::from)?;
    }
    tokio::fs::write(&path, &audio.data)
        .await
        .map_err(AppError::from)?;
    log::info!(
        "Stored {} bytes of audio for note {} at {}",
        audio.data.len(),
        note_id,
        path.display()
    );

    let format = audio_format_from_name(&audio.file_name);
    let note = state
        .processor
        .run_audio_pipeline(note_id, &audio.data, format, &path.to_string_lossy())
        .await?;

    Ok(Json(UploadResponse {
        note_id,
        message: "Audio processed successfully".to_string(),
        processing_status: note.processing_status,
    }))
}

/// GET /ai/status/{note_id}/
pub async fn processing_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(note_id): Path<i64>,
) -> ApiResult<Json<StatusResponse>> {
    let note = owned_note(&state, auth.id, note_id).await?;
    Ok(Json(StatusResponse {
        note_id,
        processing_status: note.processing_status,
        is_processed: note.is_processed(),
        has_content: note.has_content(),
    }))
}
