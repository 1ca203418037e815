//! Google Cloud Speech-to-Text adapter
//!
//! Uses the synchronous `speech:recognize` REST method with inline,
//! base64-encoded audio. Suited to short lecture clips; the API rejects
//! inline audio longer than about one minute.

use crate::error::{AppError, Result};
use crate::ports::transcription::{
    TranscriptionConfig, TranscriptionResult, TranscriptionServicePort,
};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GOOGLE_SPEECH_API_BASE: &str = "https://speech.googleapis.com/v1";

/// Google Speech-to-Text service implementation
pub struct GoogleSpeechService {
    client: Client,
    api_key: String,
    api_base: String,
    config: TranscriptionConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    language_code: String,
    enable_automatic_punctuation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<SpeechResult>,
}

#[derive(Debug, Deserialize)]
struct SpeechResult {
    #[serde(default)]
    alternatives: Vec<SpeechAlternative>,
}

#[derive(Debug, Deserialize)]
struct SpeechAlternative {
    #[serde(default)]
    transcript: String,
    confidence: Option<f32>,
}

impl GoogleSpeechService {
    pub fn new(api_key: String, config: TranscriptionConfig) -> Result<Self> {
        Self::with_api_base(api_key, config, GOOGLE_SPEECH_API_BASE.to_string())
    }

    pub fn with_api_base(
        api_key: String,
        config: TranscriptionConfig,
        api_base: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Map an audio format to a RecognitionConfig encoding
    ///
    /// WAV and FLAC carry their sample rate in the header, so none is sent.
    /// Containers the synchronous API cannot decode (mp4/m4a) are refused here
    /// rather than sent under the wrong encoding.
    fn encoding(format: &str) -> Result<(&'static str, bool)> {
        match format {
            "wav" => Ok(("LINEAR16", false)),
            "flac" => Ok(("FLAC", false)),
            "mp3" => Ok(("MP3", true)),
            "ogg" => Ok(("OGG_OPUS", true)),
            "webm" => Ok(("WEBM_OPUS", true)),
            other => Err(AppError::Transcription(format!(
                "Unsupported audio format for Google Speech: {}",
                other
            ))),
        }
    }

    /// Join the best alternative of every result, space separated
    fn collect_transcript(response: RecognizeResponse) -> TranscriptionResult {
        let mut text = String::new();
        let mut confidences = Vec::new();

        for result in response.results {
            if let Some(best) = result.alternatives.into_iter().next() {
                text.push_str(&best.transcript);
                text.push(' ');
                if let Some(c) = best.confidence {
                    confidences.push(c);
                }
            }
        }

        let confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };

        TranscriptionResult {
            text: text.trim().to_string(),
            confidence,
        }
    }
}

#[async_trait]
impl TranscriptionServicePort for GoogleSpeechService {
    async fn transcribe_bytes(
        &self,
        audio_data: &[u8],
        format: &str,
    ) -> Result<TranscriptionResult> {
        log::info!(
            "Transcribing {} bytes with Google Speech-to-Text (format: {})",
            audio_data.len(),
            format
        );

        let (encoding, needs_rate) = Self::encoding(format)?;
        let request_body = RecognizeRequest {
            config: RecognitionConfig {
                encoding,
                sample_rate_hertz: if needs_rate {
                    self.config.sample_rate_hertz
                } else {
                    None
                },
                language_code: self.config.language.clone(),
                enable_automatic_punctuation: self.config.enable_punctuation,
                model: self.config.model.clone(),
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(audio_data),
            },
        };

        let response = self
            .client
            .post(format!("{}/speech:recognize", self.api_base))
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                log::error!("Google Speech HTTP request failed: {}", e);
                AppError::Transcription(format!("Google Speech request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Google Speech API error ({}): {}", status, error_text);
            return Err(AppError::Transcription(format!(
                "Google Speech API error ({}): {}",
                status, error_text
            )));
        }

        let recognize_response: RecognizeResponse = response.json().await.map_err(|e| {
            AppError::Transcription(format!("Failed to parse Google Speech response: {}", e))
        })?;

        let result = Self::collect_transcript(recognize_response);
        log::info!(
            "Google Speech transcription complete: {} chars",
            result.text.len()
        );
        Ok(result)
    }

    fn provider_name(&self) -> &str {
        "google"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
