/// Domain models for Notescribe
///
/// These models represent core business entities and are storage-agnostic.
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default course color used by the UI
pub const DEFAULT_COURSE_COLOR: &str = "#3B82F6";

/// Position of a note in the transcribe -> generate pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Transcribing,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub const ALL: [ProcessingStatus; 5] = [
        ProcessingStatus::Pending,
        ProcessingStatus::Transcribing,
        ProcessingStatus::Processing,
        ProcessingStatus::Completed,
        ProcessingStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Transcribing => "transcribing",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Whether the pipeline is allowed to move a note from `self` to `next`
    ///
    /// A recording may be (re)submitted and AI generation (re)requested from
    /// any state. Only in-flight states can complete or fail.
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        match (self, next) {
            (_, Transcribing) => true,
            (_, Processing) => true,
            (Processing, Completed) => true,
            (Transcribing, Failed) | (Processing, Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "transcribing" => Ok(ProcessingStatus::Transcribing),
            "processing" => Ok(ProcessingStatus::Processing),
            "completed" => Ok(ProcessingStatus::Completed),
            "failed" => Ok(ProcessingStatus::Failed),
            other => Err(AppError::InvalidInput(format!(
                "Unknown processing status: {}",
                other
            ))),
        }
    }
}

/// Represents a registered user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Option<i64>,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Creates a new, active and unverified user
    pub fn new(
        email: String,
        username: String,
        first_name: String,
        last_name: String,
        password_hash: String,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            email,
            username,
            first_name,
            last_name,
            password_hash,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A course groups notes for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Course {
    /// Creates a new course with the default color
    pub fn new(user_id: i64, title: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            user_id,
            title,
            description: String::new(),
            color: DEFAULT_COURSE_COLOR.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description (builder pattern)
    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Sets the color (builder pattern)
    pub fn with_color(mut self, color: String) -> Self {
        self.color = color;
        self
    }
}

/// A unit of content, optionally produced from an audio recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Option<i64>,
    pub user_id: i64,
    pub course_id: i64,
    pub title: String,
    pub raw_content: String,
    pub key_points: Vec<String>,
    pub detailed_notes: String,
    pub audio_file_path: Option<String>,
    pub processing_status: ProcessingStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Creates a new pending note
    pub fn new(user_id: i64, course_id: i64, title: String, raw_content: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            user_id,
            course_id,
            title,
            raw_content,
            key_points: Vec::new(),
            detailed_notes: String::new(),
            audio_file_path: None,
            processing_status: ProcessingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the note to `next`, rejecting edges the pipeline does not define
    pub fn transition_to(&mut self, next: ProcessingStatus) -> Result<()> {
        if !self.processing_status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.processing_status,
                to: next,
            });
        }
        self.processing_status = next;
        self.touch();
        Ok(())
    }

    /// Completed and carrying at least some generated content
    pub fn is_processed(&self) -> bool {
        self.processing_status == ProcessingStatus::Completed
            && (!self.key_points.is_empty() || !self.detailed_notes.is_empty())
    }

    pub fn has_content(&self) -> bool {
        !self.raw_content.is_empty()
            || !self.key_points.is_empty()
            || !self.detailed_notes.is_empty()
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp();
    }
}
