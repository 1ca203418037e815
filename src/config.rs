//! Process configuration
//!
//! Built once at start-up from command-line flags or environment variables
//! and passed by reference to the token service and the adapters.

use crate::error::{AppError, Result};
use clap::Parser;
use jsonwebtoken::Algorithm;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line / environment configuration for notescribe
#[derive(Parser, Debug, Clone)]
#[command(name = "notescribe")]
#[command(about = "Course notes backend with audio transcription and AI note generation")]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000", env = "NOTESCRIBE_BIND")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, default_value = "notescribe.db", env = "NOTESCRIBE_DATABASE")]
    pub database: PathBuf,

    /// Directory for uploaded audio files
    #[arg(long, default_value = "media", env = "NOTESCRIBE_MEDIA_ROOT")]
    pub media_root: PathBuf,

    /// Secret used to sign access and refresh tokens
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: String,

    /// HMAC algorithm for tokens (HS256, HS384, HS512)
    #[arg(long, default_value = "HS256", env = "JWT_ALGORITHM")]
    pub jwt_algorithm: String,

    /// Access token lifetime in minutes
    #[arg(long, default_value_t = 60, env = "JWT_ACCESS_TOKEN_EXPIRE_MINUTES")]
    pub access_token_minutes: i64,

    /// Refresh token lifetime in days
    #[arg(long, default_value_t = 7, env = "JWT_REFRESH_TOKEN_EXPIRE_DAYS")]
    pub refresh_token_days: i64,

    /// Speech-to-text provider (google, deepgram)
    #[arg(long, default_value = "google", env = "TRANSCRIPTION_PROVIDER")]
    pub transcription_provider: String,

    /// API key for the speech-to-text provider
    #[arg(long, default_value = "", env = "TRANSCRIPTION_API_KEY", hide_env_values = true)]
    pub transcription_api_key: String,

    /// Language of uploaded recordings
    #[arg(long, default_value = "en-US", env = "TRANSCRIPTION_LANGUAGE")]
    pub transcription_language: String,

    /// Override the speech-to-text API base URL
    #[arg(long, env = "TRANSCRIPTION_API_BASE")]
    pub transcription_api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, default_value = "", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// OpenAI chat model
    #[arg(long, default_value = "gpt-3.5-turbo", env = "OPENAI_MODEL")]
    pub openai_model: String,

    /// Override the OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    pub openai_api_base: Option<String>,

    /// Largest accepted request body, in megabytes
    #[arg(long, default_value_t = 50, env = "NOTESCRIBE_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,
}

impl Config {
    /// Configuration suitable for tests: in-process secrets, no network keys
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            database: PathBuf::from(":memory:"),
            media_root: std::env::temp_dir().join("notescribe-media"),
            jwt_secret: jwt_secret.to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 7,
            transcription_provider: "google".to_string(),
            transcription_api_key: String::new(),
            transcription_language: "en-US".to_string(),
            transcription_api_base: None,
            openai_api_key: String::new(),
            openai_model: "gpt-3.5-turbo".to_string(),
            openai_api_base: None,
            max_upload_mb: 50,
        }
    }

    /// Reject configurations the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(AppError::Config("JWT secret must not be empty".to_string()));
        }
        self.algorithm()?;
        if self.access_token_minutes <= 0 || self.refresh_token_days <= 0 {
            return Err(AppError::Config(
                "Token lifetimes must be positive".to_string(),
            ));
        }
        match self.transcription_provider.as_str() {
            "google" | "deepgram" => {}
            other => {
                return Err(AppError::Config(format!(
                    "Unknown transcription provider: {}",
                    other
                )))
            }
        }
        if self.max_upload_mb == 0 {
            return Err(AppError::Config(
                "Maximum upload size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Token signing algorithm; only HMAC algorithms work with a shared secret
    pub fn algorithm(&self) -> Result<Algorithm> {
        match self.jwt_algorithm.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            other => Err(AppError::Config(format!(
                "Unsupported JWT algorithm: {}",
                other
            ))),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
