//! Deepgram transcription service adapter
//!
//! Implements the TranscriptionServicePort for Deepgram's pre-recorded API.
//! Single request with the raw audio as the body.

use crate::error::{AppError, Result};
use crate::ports::transcription::{
    TranscriptionConfig, TranscriptionResult, TranscriptionServicePort,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEEPGRAM_API_BASE: &str = "https://api.deepgram.com/v1";

/// Deepgram service implementation
pub struct DeepgramService {
    client: Client,
    api_key: String,
    api_base: String,
    config: TranscriptionConfig,
}

impl DeepgramService {
    /// Create a new Deepgram service with the given API key
    pub fn new(api_key: String, config: TranscriptionConfig) -> Result<Self> {
        Self::with_api_base(api_key, config, DEEPGRAM_API_BASE.to_string())
    }

    pub fn with_api_base(
        api_key: String,
        config: TranscriptionConfig,
        api_base: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // Longer timeout for large files
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            config,
        })
    }

    fn content_type(format: &str) -> &'static str {
        match format {
            "wav" => "audio/wav",
            "mp3" => "audio/mpeg",
            "flac" => "audio/flac",
            "ogg" => "audio/ogg",
            "mp4" => "audio/mp4",
            _ => "audio/webm",
        }
    }

    /// Parse Deepgram response into our TranscriptionResult format
    fn parse_deepgram_response(response: DeepgramResponse) -> Result<TranscriptionResult> {
        let channel = response.results.channels.into_iter().next().ok_or_else(|| {
            AppError::Transcription("No channels in Deepgram response".to_string())
        })?;

        let alternative = channel.alternatives.into_iter().next().ok_or_else(|| {
            AppError::Transcription("No alternatives in Deepgram response".to_string())
        })?;

        Ok(TranscriptionResult {
            text: alternative.transcript.trim().to_string(),
            confidence: Some(alternative.confidence),
        })
    }
}

#[async_trait]
impl TranscriptionServicePort for DeepgramService {
    async fn transcribe_bytes(
        &self,
        audio_data: &[u8],
        format: &str,
    ) -> Result<TranscriptionResult> {
        log::info!(
            "Transcribing {} bytes with Deepgram (format: {})",
            audio_data.len(),
            format
        );

        let model = self.config.model.as_deref().unwrap_or("nova-2");
        let punctuate = if self.config.enable_punctuation {
            "true"
        } else {
            "false"
        };

        let response = self
            .client
            .post(format!("{}/listen", self.api_base))
            .query(&[
                ("model", model),
                ("punctuate", punctuate),
                ("language", self.config.language.as_str()),
            ])
            .header("authorization", format!("Token {}", self.api_key))
            .header("content-type", Self::content_type(format))
            .body(audio_data.to_vec())
            .send()
            .await
            .map_err(|e| {
                log::error!("Deepgram HTTP request failed: {}", e);
                AppError::Transcription(format!("Deepgram request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Deepgram API error response: {}", error_text);
            return Err(AppError::Transcription(format!(
                "Deepgram API error ({}): {}",
                status, error_text
            )));
        }

        let deepgram_response: DeepgramResponse = response.json().await.map_err(|e| {
            AppError::Transcription(format!("Failed to parse Deepgram response: {}", e))
        })?;

        let result = Self::parse_deepgram_response(deepgram_response)?;
        log::info!("Deepgram transcription complete: {} chars", result.text.len());
        Ok(result)
    }

    fn provider_name(&self) -> &str {
        "deepgram"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

// ===== API Response Types =====

/// Response from /v1/listen endpoint
#[derive(Debug, Deserialize)]
struct DeepgramResponse {
    results: Results,
}

#[derive(Debug, Deserialize)]
struct Results {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: String,
    confidence: f32,
}
