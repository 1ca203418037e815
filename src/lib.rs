//! notescribe: course notes backend
//!
//! Users keep notes grouped by course. A note's raw content, typed in or
//! transcribed from an uploaded recording, is turned into key points and
//! detailed notes by an LLM.
//!
//! Layout follows ports and adapters:
//! - `domain`: entities and the processing status machine
//! - `ports`: traits for storage, speech-to-text and generation
//! - `adapters`: SQLite, Google/Deepgram speech, OpenAI
//! - `services`: pipeline orchestrator, tokens, passwords
//! - `api`: axum routes

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use api::{build_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
