//! Note processing orchestrator
//!
//! Drives a note through `pending -> transcribing -> processing -> completed`
//! by calling the transcription and generation adapters in sequence. Each
//! non-terminal status is persisted before the adapter call it precedes, so
//! an interrupted run leaves the last step it reached on the row.
//!
//! Two runs on the same note are not serialized; the store is
//! last-write-wins and their status writes may interleave.

use crate::domain::models::{Note, ProcessingStatus};
use crate::error::{AppError, Result};
use crate::ports::llm::LlmServicePort;
use crate::ports::storage::StoragePort;
use crate::ports::transcription::TranscriptionServicePort;
use std::sync::Arc;

pub struct NoteProcessor {
    storage: Arc<dyn StoragePort>,
    transcriber: Arc<dyn TranscriptionServicePort>,
    generator: Arc<dyn LlmServicePort>,
}

impl NoteProcessor {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        transcriber: Arc<dyn TranscriptionServicePort>,
        generator: Arc<dyn LlmServicePort>,
    ) -> Self {
        Self {
            storage,
            transcriber,
            generator,
        }
    }

    /// Generate key points and detailed notes from the note's raw content
    ///
    /// On failure the note is marked `failed` (best effort) and the original
    /// error is returned.
    pub async fn run_text_pipeline(&self, note_id: i64) -> Result<Note> {
        match self.generate(note_id).await {
            Ok(note) => Ok(note),
            Err(e) => {
                log::error!("AI processing failed for note {}: {}", note_id, e);
                self.record_failure(note_id, &e).await;
                Err(e)
            }
        }
    }

    /// Transcribe an uploaded recording into the note, then run the text pipeline
    pub async fn run_audio_pipeline(
        &self,
        note_id: i64,
        audio_data: &[u8],
        format: &str,
        audio_file_path: &str,
    ) -> Result<Note> {
        if let Err(e) = self
            .transcribe(note_id, audio_data, format, audio_file_path)
            .await
        {
            log::error!("Transcription failed for note {}: {}", note_id, e);
            self.record_failure(note_id, &e).await;
            return Err(e);
        }

        self.run_text_pipeline(note_id).await
    }

    async fn transcribe(
        &self,
        note_id: i64,
        audio_data: &[u8],
        format: &str,
        audio_file_path: &str,
    ) -> Result<()> {
        let mut note = self.load(note_id).await?;
        note.transition_to(ProcessingStatus::Transcribing)?;
        self.storage.update_note(&note).await?;
        log::info!("Note {} transcribing ({} bytes)", note_id, audio_data.len());

        let transcript = self.transcriber.transcribe_bytes(audio_data, format).await?;

        note.raw_content = transcript.text;
        note.audio_file_path = Some(audio_file_path.to_string());
        note.touch();
        self.storage.update_note(&note).await?;
        log::info!(
            "Note {} transcribed: {} chars",
            note_id,
            note.raw_content.len()
        );
        Ok(())
    }

    async fn generate(&self, note_id: i64) -> Result<Note> {
        let mut note = self.load(note_id).await?;
        note.transition_to(ProcessingStatus::Processing)?;
        self.storage.update_note(&note).await?;
        log::info!("Note {} processing", note_id);

        if note.raw_content.trim().is_empty() {
            return Err(AppError::NoContent);
        }

        let generated = self.generator.generate_content(&note.raw_content).await?;

        note.key_points = generated.key_points;
        note.detailed_notes = generated.detailed_notes;
        note.transition_to(ProcessingStatus::Completed)?;
        self.storage.update_note(&note).await?;
        log::info!(
            "Note {} completed with {} key points",
            note_id,
            note.key_points.len()
        );
        Ok(note)
    }

    async fn load(&self, note_id: i64) -> Result<Note> {
        self.storage
            .get_note(note_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Note {}", note_id)))
    }

    /// Mark the stored note `failed`
    ///
    /// Secondary errors are logged and dropped so they never replace `cause`.
    /// Notes that are not in flight (e.g. a rejected transition) keep their status.
    async fn record_failure(&self, note_id: i64, cause: &AppError) {
        let outcome: Result<()> = async {
            let Some(mut note) = self.storage.get_note(note_id).await? else {
                return Ok(());
            };
            if note
                .processing_status
                .can_transition_to(ProcessingStatus::Failed)
            {
                note.transition_to(ProcessingStatus::Failed)?;
                self.storage.update_note(&note).await?;
            }
            Ok(())
        }
        .await;

        if let Err(e) = outcome {
            log::warn!(
                "Could not mark note {} failed after '{}': {}",
                note_id,
                cause,
                e
            );
        }
    }
}
