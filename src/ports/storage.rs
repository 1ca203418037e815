/// Storage port trait
///
/// Defines the interface for database operations.
/// Implementation: SQLite adapter
use crate::domain::models::{Course, Note, User};
use crate::error::Result;
use async_trait::async_trait;

/// Port trait for storage operations
///
/// Writes are last-write-wins: `update_note` replaces the whole row.
#[async_trait]
pub trait StoragePort: Send + Sync {
    // User operations
    /// Create a new user
    async fn create_user(&self, user: &User) -> Result<i64>;

    /// Get a user by ID
    async fn get_user(&self, id: i64) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Update profile fields of a user
    async fn update_user(&self, user: &User) -> Result<()>;

    // Course operations
    /// Create a new course
    async fn create_course(&self, course: &Course) -> Result<i64>;

    /// Get a course by ID
    async fn get_course(&self, id: i64) -> Result<Option<Course>>;

    /// Find a user's course by exact title
    async fn find_course_by_title(&self, user_id: i64, title: &str) -> Result<Option<Course>>;

    /// List a user's courses, most recently updated first
    async fn list_courses(&self, user_id: i64) -> Result<Vec<Course>>;

    /// Update a course
    async fn update_course(&self, course: &Course) -> Result<()>;

    /// Delete a course and its notes
    async fn delete_course(&self, id: i64) -> Result<()>;

    /// Number of notes in a course
    async fn count_notes(&self, course_id: i64) -> Result<i64>;

    // Note operations
    /// Create a new note
    async fn create_note(&self, note: &Note) -> Result<i64>;

    /// Get a note by ID
    async fn get_note(&self, id: i64) -> Result<Option<Note>>;

    /// List a user's notes, optionally within one course
    async fn list_notes(&self, user_id: i64, course_id: Option<i64>) -> Result<Vec<Note>>;

    /// Update a note
    async fn update_note(&self, note: &Note) -> Result<()>;

    /// Delete a note
    async fn delete_note(&self, id: i64) -> Result<()>;

    /// Case-insensitive search over title, raw content and detailed notes
    async fn search_notes(
        &self,
        user_id: i64,
        query: &str,
        course_id: Option<i64>,
    ) -> Result<Vec<Note>>;
}
