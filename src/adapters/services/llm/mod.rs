//! LLM service adapters
//!
//! Implementations of the LlmServicePort trait:
//! - OpenAI (chat completions)

pub mod openai;

pub use openai::OpenAIService;

use crate::config::Config;
use crate::error::Result;
use crate::ports::llm::{LlmConfig, LlmServicePort};
use std::sync::Arc;

/// Build the content generation service from configuration
pub fn build_llm_service(config: &Config) -> Result<Arc<dyn LlmServicePort>> {
    let llm_config = LlmConfig {
        model: config.openai_model.clone(),
        ..LlmConfig::default()
    };
    let api_key = config.openai_api_key.clone();

    let service = match &config.openai_api_base {
        Some(base) => OpenAIService::with_api_base(api_key, llm_config, base.clone())?,
        None => OpenAIService::new(api_key, llm_config)?,
    };

    if !service.is_configured() {
        log::warn!("OpenAI API key is not set; note generation will fail");
    }

    Ok(Arc::new(service))
}
