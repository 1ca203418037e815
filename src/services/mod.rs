//! Application services
//!
//! - `pipeline`: note processing orchestrator (transcribe -> generate -> persist)
//! - `token`: access/refresh token issuance and verification
//! - `password`: password hashing and policy

pub mod password;
pub mod pipeline;
pub mod token;

pub use pipeline::NoteProcessor;
pub use token::{Claims, TokenPair, TokenService, TokenType};
