//! OpenAI LLM service adapter
//!
//! Implements the LlmServicePort for OpenAI's chat completion API.
//! Each generation issues two requests: one for key points, one for
//! detailed notes.

use crate::domain::PromptTemplates;
use crate::error::{AppError, Result};
use crate::ports::llm::{GeneratedContent, KeyPointsOutput, LlmConfig, LlmServicePort};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    api_base: String,
    config: LlmConfig,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAIService {
    /// Create a new OpenAI service with the given API key
    pub fn new(api_key: String, config: LlmConfig) -> Result<Self> {
        Self::with_api_base(api_key, config, OPENAI_API_BASE.to_string())
    }

    /// Create a service that talks to a different API base (proxies, tests)
    pub fn with_api_base(api_key: String, config: LlmConfig, api_base: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Run one chat completion and return the first choice's text
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: String,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let request_body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens,
        };

        log::info!(
            "Calling OpenAI chat completion with model: {}",
            self.config.model
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                log::error!("OpenAI HTTP request failed: {}", e);
                AppError::Generation(format!("Chat completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("OpenAI API error ({}): {}", status, error_text);
            return Err(AppError::Generation(format!(
                "Chat completion failed ({}): {}",
                status, error_text
            )));
        }

        let completion_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::Generation(format!("Failed to parse completion response: {}", e))
        })?;

        let content = completion_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generation("No completion choices returned".to_string()))?;

        log::info!(
            "OpenAI completion successful, generated {} characters",
            content.len()
        );

        Ok(content)
    }
}

#[async_trait]
impl LlmServicePort for OpenAIService {
    async fn generate_content(&self, content: &str) -> Result<GeneratedContent> {
        let key_points_raw = self
            .complete(
                PromptTemplates::key_points_system(),
                PromptTemplates::render(PromptTemplates::key_points(), content),
                self.config.key_points_max_tokens,
            )
            .await?;

        let detailed_notes = self
            .complete(
                PromptTemplates::detailed_notes_system(),
                PromptTemplates::render(PromptTemplates::detailed_notes(), content),
                self.config.detailed_notes_max_tokens,
            )
            .await?;

        let parsed = KeyPointsOutput::parse(&key_points_raw);
        if parsed.is_fallback() {
            log::warn!("Model returned non-JSON key points, using one point per line");
        }

        Ok(GeneratedContent {
            key_points: parsed.into_key_points(),
            detailed_notes: detailed_notes.trim().to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
