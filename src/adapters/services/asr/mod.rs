//! ASR (Automatic Speech Recognition) service adapters
//!
//! This module provides adapters for different ASR providers:
//! - Google Speech-to-Text: REST `speech:recognize` with inline audio
//! - Deepgram: REST API with the audio as request body

pub mod deepgram;
pub mod google;

pub use deepgram::DeepgramService;
pub use google::GoogleSpeechService;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::ports::transcription::{TranscriptionConfig, TranscriptionServicePort};
use std::sync::Arc;

/// Build the configured ASR service
pub fn build_asr_service(config: &Config) -> Result<Arc<dyn TranscriptionServicePort>> {
    let transcription_config = TranscriptionConfig {
        language: config.transcription_language.clone(),
        ..TranscriptionConfig::default()
    };
    let api_key = config.transcription_api_key.clone();

    let service: Arc<dyn TranscriptionServicePort> =
        match config.transcription_provider.as_str() {
            "google" => Arc::new(match &config.transcription_api_base {
                Some(base) => {
                    GoogleSpeechService::with_api_base(api_key, transcription_config, base.clone())?
                }
                None => GoogleSpeechService::new(api_key, transcription_config)?,
            }),
            "deepgram" => Arc::new(match &config.transcription_api_base {
                Some(base) => {
                    DeepgramService::with_api_base(api_key, transcription_config, base.clone())?
                }
                None => DeepgramService::new(api_key, transcription_config)?,
            }),
            other => {
                return Err(AppError::Config(format!(
                    "Unknown ASR provider: {}",
                    other
                )))
            }
        };

    if !service.is_configured() {
        log::warn!(
            "ASR provider {} has no API key; audio uploads will fail",
            service.provider_name()
        );
    }

    Ok(service)
}
