/// SQLite storage adapter
///
/// Implements StoragePort for SQLite database operations.
use crate::domain::models::{Course, Note, ProcessingStatus, User};
use crate::error::{AppError, Result};
use crate::ports::storage::StoragePort;
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, password_hash,
     is_active, is_verified, created_at, updated_at";

const COURSE_COLUMNS: &str =
    "id, user_id, title, description, color, created_at, updated_at";

const NOTE_COLUMNS: &str = "id, user_id, course_id, title, raw_content, key_points,
     detailed_notes, audio_file_path, processing_status, created_at, updated_at";

/// SQLite storage implementation
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path
    pub fn new(db_path: PathBuf) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Create a storage backed by a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run database migrations
    pub fn run_migrations(&self) -> Result<()> {
        use rusqlite_migration::{Migrations, M};

        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../../migrations/001_initial.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| AppError::Database(rusqlite::Error::ToSqlConversionFailure(Box::new(e))))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Other("Database connection lock poisoned".to_string()))
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: Some(row.get(0)?),
        email: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        password_hash: row.get(5)?,
        is_active: row.get(6)?,
        is_verified: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_course(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let key_points_json: String = row.get(5)?;
    let key_points: Vec<String> = serde_json::from_str(&key_points_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    let status_str: String = row.get(8)?;
    let processing_status = status_str
        .parse::<ProcessingStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(Note {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        course_id: row.get(2)?,
        title: row.get(3)?,
        raw_content: row.get(4)?,
        key_points,
        detailed_notes: row.get(6)?,
        audio_file_path: row.get(7)?,
        processing_status,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Map a UNIQUE violation to a conflict, leave everything else as a database error
fn map_unique(e: rusqlite::Error, what: &str) -> AppError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            AppError::Conflict(format!("{} already exists", what))
        }
        other => AppError::Database(other),
    }
}

#[async_trait]
impl StoragePort for SqliteStorage {
    async fn create_user(&self, user: &User) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (email, username, first_name, last_name, password_hash,
             is_active, is_verified, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.email,
                user.username,
                user.first_name,
                user.last_name,
                user.password_hash,
                user.is_active,
                user.is_verified,
                user.created_at,
                user.updated_at,
            ],
        )
        .map_err(|e| map_unique(e, "User"))?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET username = ?1, first_name = ?2, last_name = ?3,
             is_active = ?4, is_verified = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                user.username,
                user.first_name,
                user.last_name,
                user.is_active,
                user.is_verified,
                user.updated_at,
                user.id,
            ],
        )
        .map_err(|e| map_unique(e, "User"))?;
        Ok(())
    }

    async fn create_course(&self, course: &Course) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO courses (user_id, title, description, color, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                course.user_id,
                course.title,
                course.description,
                course.color,
                course.created_at,
                course.updated_at,
            ],
        )
        .map_err(|e| map_unique(e, "Course"))?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_course(&self, id: i64) -> Result<Option<Course>> {
        let conn = self.conn()?;
        let course = conn
            .query_row(
                &format!("SELECT {} FROM courses WHERE id = ?1", COURSE_COLUMNS),
                params![id],
                row_to_course,
            )
            .optional()?;
        Ok(course)
    }

    async fn find_course_by_title(&self, user_id: i64, title: &str) -> Result<Option<Course>> {
        let conn = self.conn()?;
        let course = conn
            .query_row(
                &format!(
                    "SELECT {} FROM courses WHERE user_id = ?1 AND title = ?2",
                    COURSE_COLUMNS
                ),
                params![user_id, title],
                row_to_course,
            )
            .optional()?;
        Ok(course)
    }

    async fn list_courses(&self, user_id: i64) -> Result<Vec<Course>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM courses WHERE user_id = ?1 ORDER BY updated_at DESC, id DESC",
            COURSE_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_course)?;

        let mut courses = Vec::new();
        for course_result in rows {
            courses.push(course_result?);
        }

        Ok(courses)
    }

    async fn update_course(&self, course: &Course) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE courses SET title = ?1, description = ?2, color = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                course.title,
                course.description,
                course.color,
                course.updated_at,
                course.id,
            ],
        )
        .map_err(|e| map_unique(e, "Course"))?;
        Ok(())
    }

    async fn delete_course(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM courses WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn count_notes(&self, course_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE course_id = ?1",
            params![course_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn create_note(&self, note: &Note) -> Result<i64> {
        let key_points = serde_json::to_string(&note.key_points)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO notes (user_id, course_id, title, raw_content, key_points, detailed_notes,
             audio_file_path, processing_status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                note.user_id,
                note.course_id,
                note.title,
                note.raw_content,
                key_points,
                note.detailed_notes,
                note.audio_file_path,
                note.processing_status.as_str(),
                note.created_at,
                note.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        let conn = self.conn()?;
        let note = conn
            .query_row(
                &format!("SELECT {} FROM notes WHERE id = ?1", NOTE_COLUMNS),
                params![id],
                row_to_note,
            )
            .optional()?;
        Ok(note)
    }

    async fn list_notes(&self, user_id: i64, course_id: Option<i64>) -> Result<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes WHERE user_id = ?1 AND (?2 IS NULL OR course_id = ?2)
             ORDER BY updated_at DESC, id DESC",
            NOTE_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id, course_id], row_to_note)?;

        let mut notes = Vec::new();
        for note_result in rows {
            notes.push(note_result?);
        }

        Ok(notes)
    }

    async fn update_note(&self, note: &Note) -> Result<()> {
        let key_points = serde_json::to_string(&note.key_points)?;
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notes SET course_id = ?1, title = ?2, raw_content = ?3, key_points = ?4,
             detailed_notes = ?5, audio_file_path = ?6, processing_status = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                note.course_id,
                note.title,
                note.raw_content,
                key_points,
                note.detailed_notes,
                note.audio_file_path,
                note.processing_status.as_str(),
                note.updated_at,
                note.id,
            ],
        )?;

        if changed == 0 {
            return Err(AppError::NotFound(format!("Note {:?}", note.id)));
        }
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn search_notes(
        &self,
        user_id: i64,
        query: &str,
        course_id: Option<i64>,
    ) -> Result<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes
             WHERE user_id = ?1 AND (?2 IS NULL OR course_id = ?2)
               AND (instr(lower(title), lower(?3)) > 0
                    OR instr(lower(raw_content), lower(?3)) > 0
                    OR instr(lower(detailed_notes), lower(?3)) > 0)
             ORDER BY updated_at DESC, id DESC",
            NOTE_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id, course_id, query], row_to_note)?;

        let mut notes = Vec::new();
        for note_result in rows {
            notes.push(note_result?);
        }

        Ok(notes)
    }
}
