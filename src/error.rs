/// Error types for Notescribe
///
/// Uses thiserror for ergonomic error handling with proper Display implementations.
use crate::domain::models::ProcessingStatus;
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Speech-to-text failed: {0}")]
    Transcription(String),

    #[error("AI processing failed: {0}")]
    Generation(String),

    #[error("No raw content to process")]
    NoContent,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ProcessingStatus,
        to: ProcessingStatus,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// True for errors raised by an external service adapter
    pub fn is_adapter_error(&self) -> bool {
        matches!(self, AppError::Transcription(_) | AppError::Generation(_))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
