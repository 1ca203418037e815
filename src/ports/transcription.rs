/// Transcription service port trait
///
/// Defines the interface for ASR (Automatic Speech Recognition) services.
/// Implementations: Google Speech-to-Text, Deepgram
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Represents a transcription result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    /// Full transcript text
    pub text: String,

    /// Overall confidence score (0.0 to 1.0)
    pub confidence: Option<f32>,
}

/// Configuration for transcription requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Language code (e.g., "en-US")
    pub language: String,

    /// Provider model override
    pub model: Option<String>,

    /// Add punctuation to the transcript
    pub enable_punctuation: bool,

    /// Sample rate of the uploaded audio, if known
    pub sample_rate_hertz: Option<u32>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            model: None,
            enable_punctuation: true,
            sample_rate_hertz: Some(48000),
        }
    }
}

/// Port trait for transcription services (ASR)
///
/// A single attempt per call; failures surface as `AppError::Transcription`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionServicePort: Send + Sync {
    /// Transcribe audio from raw bytes
    async fn transcribe_bytes(
        &self,
        audio_data: &[u8],
        format: &str, // "webm", "wav", "mp3", etc.
    ) -> Result<TranscriptionResult>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Check if the service is configured (has API key)
    fn is_configured(&self) -> bool;
}

/// Guess the audio format from a file name
pub fn audio_format_from_name(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => "wav",
        "mp3" => "mp3",
        "flac" => "flac",
        "ogg" | "oga" => "ogg",
        "m4a" | "mp4" => "mp4",
        _ => "webm",
    }
}
