//! Mock implementations for testing

use crate::domain::models::{Course, Note, ProcessingStatus, User};
use crate::error::{AppError, Result};
use crate::ports::storage::StoragePort;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock storage implementation for testing
///
/// Every note write is appended to a status history so tests can check the
/// order in which pipeline states were persisted.
#[derive(Clone, Default)]
pub struct MockStorage {
    users: Arc<Mutex<HashMap<i64, User>>>,
    courses: Arc<Mutex<HashMap<i64, Course>>>,
    notes: Arc<Mutex<HashMap<i64, Note>>>,
    status_history: Arc<Mutex<Vec<ProcessingStatus>>>,
    fail_note_updates: Arc<AtomicBool>,
    next_id: Arc<Mutex<i64>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    /// Current stored copy of a note, without going through the port
    pub fn note_snapshot(&self, id: i64) -> Option<Note> {
        self.notes.lock().unwrap().get(&id).cloned()
    }

    /// Statuses in the order `update_note` persisted them
    pub fn status_history(&self) -> Vec<ProcessingStatus> {
        self.status_history.lock().unwrap().clone()
    }

    /// Make every subsequent `update_note` fail
    pub fn fail_note_updates(&self, fail: bool) {
        self.fail_note_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoragePort for MockStorage {
    async fn create_user(&self, user: &User) -> Result<i64> {
        let id = self.next_id();
        let mut u = user.clone();
        u.id = Some(id);
        self.users.lock().unwrap().insert(id, u);
        Ok(id)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        if let Some(id) = user.id {
            self.users.lock().unwrap().insert(id, user.clone());
        }
        Ok(())
    }

    async fn create_course(&self, course: &Course) -> Result<i64> {
        let id = self.next_id();
        let mut c = course.clone();
        c.id = Some(id);
        self.courses.lock().unwrap().insert(id, c);
        Ok(id)
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>> {
        Ok(self.courses.lock().unwrap().get(&id).cloned())
    }

    async fn find_course_by_title(&self, user_id: i64, title: &str) -> Result<Option<Course>> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .values()
            .find(|c| c.user_id == user_id && c.title == title)
            .cloned())
    }

    async fn list_courses(&self, user_id: i64) -> Result<Vec<Course>> {
        let mut list: Vec<_> = self
            .courses
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by_key(|c| -c.updated_at);
        Ok(list)
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        if let Some(id) = course.id {
            self.courses.lock().unwrap().insert(id, course.clone());
        }
        Ok(())
    }

    async fn delete_course(&self, id: i64) -> Result<()> {
        self.courses.lock().unwrap().remove(&id);
        self.notes.lock().unwrap().retain(|_, n| n.course_id != id);
        Ok(())
    }

    async fn count_notes(&self, course_id: i64) -> Result<i64> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.course_id == course_id)
            .count() as i64)
    }

    async fn create_note(&self, note: &Note) -> Result<i64> {
        let id = self.next_id();
        let mut n = note.clone();
        n.id = Some(id);
        self.notes.lock().unwrap().insert(id, n);
        Ok(id)
    }

    async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        Ok(self.notes.lock().unwrap().get(&id).cloned())
    }

    async fn list_notes(&self, user_id: i64, course_id: Option<i64>) -> Result<Vec<Note>> {
        let mut list: Vec<_> = self
            .notes
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.user_id == user_id && course_id.map_or(true, |c| n.course_id == c))
            .cloned()
            .collect();
        list.sort_by_key(|n| -n.updated_at);
        Ok(list)
    }

    async fn update_note(&self, note: &Note) -> Result<()> {
        if self.fail_note_updates.load(Ordering::SeqCst) {
            return Err(AppError::Other("simulated write failure".to_string()));
        }
        if let Some(id) = note.id {
            self.status_history
                .lock()
                .unwrap()
                .push(note.processing_status);
            self.notes.lock().unwrap().insert(id, note.clone());
        }
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> Result<()> {
        self.notes.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn search_notes(
        &self,
        user_id: i64,
        query: &str,
        course_id: Option<i64>,
    ) -> Result<Vec<Note>> {
        let query = query.to_lowercase();
        let list = self.list_notes(user_id, course_id).await?;
        Ok(list
            .into_iter()
            .filter(|n| {
                n.title.to_lowercase().contains(&query)
                    || n.raw_content.to_lowercase().contains(&query)
                    || n.detailed_notes.to_lowercase().contains(&query)
            })
            .collect())
    }
}
