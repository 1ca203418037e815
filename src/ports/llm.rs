/// LLM service port trait
///
/// Defines the interface for content generation services.
/// Implementation: OpenAI
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Key points and structured notes generated from raw content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneratedContent {
    pub key_points: Vec<String>,
    pub detailed_notes: String,
}

/// Model output for the key-points request, classified once at the parse boundary
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPointsOutput {
    /// The model returned a JSON array of strings
    Structured(Vec<String>),
    /// Anything else; one key point per non-empty line
    RawText(String),
}

impl KeyPointsOutput {
    /// Classify raw model output
    ///
    /// A surrounding markdown code fence is stripped before the JSON attempt.
    pub fn parse(output: &str) -> Self {
        let trimmed = output.trim();
        let mut candidate = trimmed;

        if candidate.starts_with("```") {
            candidate = candidate.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        }
        if candidate.ends_with("```") {
            candidate = candidate.rsplit_once('\n').map(|(head, _)| head).unwrap_or("");
        }

        match serde_json::from_str::<Vec<String>>(candidate) {
            Ok(points) => KeyPointsOutput::Structured(points),
            Err(e) => {
                log::debug!("Key points are not a JSON string array ({}), splitting lines", e);
                KeyPointsOutput::RawText(trimmed.to_string())
            }
        }
    }

    pub fn into_key_points(self) -> Vec<String> {
        match self {
            KeyPointsOutput::Structured(points) => points,
            KeyPointsOutput::RawText(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, KeyPointsOutput::RawText(_))
    }
}

/// Configuration for LLM requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name (e.g., "gpt-3.5-turbo")
    pub model: String,

    /// Temperature for generation (0.0 to 1.0)
    pub temperature: Option<f32>,

    /// Maximum tokens for the key points response
    pub key_points_max_tokens: Option<u32>,

    /// Maximum tokens for the detailed notes response
    pub detailed_notes_max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: Some(0.3),
            key_points_max_tokens: Some(500),
            detailed_notes_max_tokens: Some(1500),
        }
    }
}

/// Port trait for LLM services
///
/// A single attempt per call; failures surface as `AppError::Generation`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmServicePort: Send + Sync {
    /// Generate key points and detailed notes from raw content
    async fn generate_content(&self, content: &str) -> Result<GeneratedContent>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Check if the service is configured (has API key)
    fn is_configured(&self) -> bool;
}
