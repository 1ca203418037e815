/// Domain layer - core business models
///
/// These models are storage-agnostic and represent core business entities.
pub mod models;
pub mod prompts;

pub use models::{Course, Note, ProcessingStatus, User, DEFAULT_COURSE_COLOR};
pub use prompts::PromptTemplates;
