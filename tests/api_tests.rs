//! Integration tests for the HTTP API
//!
//! Drive the full router against an in-memory SQLite database with scripted
//! speech-to-text and generation adapters.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use notescribe::adapters::storage::SqliteStorage;
use notescribe::error::{AppError, Result};
use notescribe::ports::llm::{GeneratedContent, KeyPointsOutput, LlmServicePort};
use notescribe::ports::transcription::{TranscriptionResult, TranscriptionServicePort};
use notescribe::services::{NoteProcessor, TokenService};
use notescribe::{build_router, AppState, Config};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "notescribe-test-boundary";

/// Returns a fixed transcript; the bytes `bad` fail
struct ScriptedTranscriber {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscriptionServicePort for ScriptedTranscriber {
    async fn transcribe_bytes(
        &self,
        audio_data: &[u8],
        _format: &str,
    ) -> Result<TranscriptionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if audio_data == b"bad" {
            return Err(AppError::Transcription("unsupported encoding".into()));
        }
        Ok(TranscriptionResult {
            text: "Photosynthesis\nChlorophyll\nLight reactions".into(),
            confidence: Some(0.95),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Echoes content back as key points; content containing `FAIL` fails
struct ScriptedGenerator {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmServicePort for ScriptedGenerator {
    async fn generate_content(&self, content: &str) -> Result<GeneratedContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if content.contains("FAIL") {
            return Err(AppError::Generation("model overloaded".into()));
        }
        Ok(GeneratedContent {
            key_points: KeyPointsOutput::parse(content).into_key_points(),
            detailed_notes: format!("# Notes\n\n{}", content),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        true
    }
}

struct TestApp {
    router: Router,
    media: TempDir,
    transcriptions: Arc<AtomicUsize>,
    generations: Arc<AtomicUsize>,
}

impl TestApp {
    fn new() -> Self {
        let media = TempDir::new().unwrap();
        let mut config = Config::for_tests("integration-secret");
        config.media_root = media.path().to_path_buf();

        let storage = SqliteStorage::in_memory().unwrap();
        storage.run_migrations().unwrap();
        let storage = Arc::new(storage);

        let transcriptions = Arc::new(AtomicUsize::new(0));
        let generations = Arc::new(AtomicUsize::new(0));
        let processor = NoteProcessor::new(
            storage.clone(),
            Arc::new(ScriptedTranscriber {
                calls: transcriptions.clone(),
            }),
            Arc::new(ScriptedGenerator {
                calls: generations.clone(),
            }),
        );

        let state = AppState {
            storage,
            tokens: Arc::new(TokenService::from_config(&config).unwrap()),
            processor: Arc::new(processor),
            config: Arc::new(config),
        };

        Self {
            router: build_router(state),
            media,
            transcriptions,
            generations,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Register a user and return its access token
    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/auth/register/",
                None,
                Some(json!({
                    "email": format!("{}@example.com", username),
                    "username": username,
                    "first_name": "Test",
                    "last_name": "User",
                    "password": "s3cure-pass",
                    "password_confirm": "s3cure-pass"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["tokens"]["access_token"].as_str().unwrap().to_string()
    }

    async fn create_course(&self, token: &str, title: &str) -> i64 {
        let (status, body) = self
            .call("POST", "/courses/", Some(token), Some(json!({ "title": title })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["course"]["id"].as_i64().unwrap()
    }

    async fn create_note(&self, token: &str, course_id: i64, raw_content: &str) -> Value {
        let (status, body) = self
            .call(
                "POST",
                "/notes/",
                Some(token),
                Some(json!({
                    "title": "Lecture",
                    "course_id": course_id,
                    "raw_content": raw_content
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["note"].clone()
    }

    async fn upload(&self, token: &str, note_id: i64, audio: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"note_id\"\r\n\r\n{id}\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"audio_file\"; \
                 filename=\"lecture one.webm\"\r\n\
                 Content-Type: audio/webm\r\n\r\n",
                b = BOUNDARY,
                id = note_id
            )
            .as_bytes(),
        );
        body.extend_from_slice(audio);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/ai/upload-audio/")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_access_token() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/notes/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = app.call("GET", "/notes/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_refresh_flow() {
    let app = TestApp::new();
    let token = app.register("ada").await;

    let (status, body) = app.call("GET", "/auth/profile/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "ada");
    assert_eq!(body["full_name"], "Test User");
    assert!(body.get("password_hash").is_none());

    let (status, _) = app
        .call(
            "POST",
            "/auth/login/",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            "POST",
            "/auth/login/",
            None,
            Some(json!({ "email": "ada@example.com", "password": "s3cure-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens"]["expires_in"], 3600);
    let refresh_token = body["tokens"]["refresh_token"].as_str().unwrap().to_string();

    // an access token is not accepted where a refresh token is expected
    let (status, _) = app
        .call(
            "POST",
            "/auth/refresh/",
            None,
            Some(json!({ "refresh_token": token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            "POST",
            "/auth/refresh/",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tokens"]["access_token"].is_string());

    // a refresh token is not accepted as a bearer token
    let (status, _) = app
        .call("GET", "/auth/profile/", Some(&refresh_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let app = TestApp::new();
    app.register("ada").await;

    let (status, _) = app
        .call(
            "POST",
            "/auth/register/",
            None,
            Some(json!({
                "email": "ada@example.com",
                "username": "ada2",
                "password": "s3cure-pass",
                "password_confirm": "s3cure-pass"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            "POST",
            "/auth/register/",
            None,
            Some(json!({
                "email": "bob@example.com",
                "username": "bob",
                "password": "12345678",
                "password_confirm": "12345678"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new();
    let token = app.register("ada").await;

    let (status, body) = app
        .call(
            "PUT",
            "/auth/profile/update/",
            Some(&token),
            Some(json!({ "first_name": "Ada", "last_name": "Lovelace" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["full_name"], "Ada Lovelace");
    assert_eq!(body["user"]["email"], "ada@example.com");
}

// =============================================================================
// Courses
// =============================================================================

#[tokio::test]
async fn test_course_crud_and_title_uniqueness() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;

    let (status, _) = app
        .call("POST", "/courses/", Some(&token), Some(json!({ "title": "Biology" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call(
            "PUT",
            &format!("/courses/{}/", course_id),
            Some(&token),
            Some(json!({ "color": "#10B981", "description": "Cells and more" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["color"], "#10B981");

    app.create_note(&token, course_id, "").await;
    let (status, body) = app.call("GET", "/courses/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["courses"][0]["notes_count"], 1);

    let (status, _) = app
        .call("DELETE", &format!("/courses/{}/", course_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.call("GET", "/notes/", Some(&token), None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_courses_are_private() {
    let app = TestApp::new();
    let ada = app.register("ada").await;
    let bob = app.register("bob").await;
    let course_id = app.create_course(&ada, "Biology").await;

    let (status, _) = app
        .call("GET", &format!("/courses/{}/", course_id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            "POST",
            "/notes/",
            Some(&bob),
            Some(json!({ "title": "Sneaky", "course_id": course_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("your own courses"));
}

// =============================================================================
// Notes and the text pipeline
// =============================================================================

#[tokio::test]
async fn test_note_with_content_is_processed_on_create() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;

    let note = app
        .create_note(&token, course_id, "Cells\nMitochondria\nATP")
        .await;
    assert_eq!(note["processing_status"], "completed");
    assert_eq!(note["key_points"], json!(["Cells", "Mitochondria", "ATP"]));
    assert_eq!(note["is_processed"], true);
    assert_eq!(note["course_title"], "Biology");
    assert_eq!(app.generations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_note_is_not_processed() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;

    let note = app.create_note(&token, course_id, "").await;
    assert_eq!(note["processing_status"], "pending");
    assert_eq!(note["has_content"], false);
    assert_eq!(app.generations.load(Ordering::SeqCst), 0);

    let (status, body) = app
        .call(
            "POST",
            &format!("/notes/{}/reprocess/", note["id"]),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "Invalid input: Cannot reprocess note without raw content"
    );
}

#[tokio::test]
async fn test_generation_failure_on_create_still_creates_note() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;

    let note = app.create_note(&token, course_id, "FAIL please").await;
    assert_eq!(note["processing_status"], "failed");
    assert_eq!(note["key_points"], json!([]));

    let (status, body) = app
        .call(
            "POST",
            &format!("/notes/{}/reprocess/", note["id"]),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "GENERATION_FAILED");
    assert_eq!(
        body["error"]["message"],
        "AI processing failed: model overloaded"
    );
}

#[tokio::test]
async fn test_update_reprocesses_only_when_content_changes() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;
    let note = app.create_note(&token, course_id, "First").await;
    let uri = format!("/notes/{}/", note["id"]);

    let (status, _) = app
        .call("PUT", &uri, Some(&token), Some(json!({ "title": "Renamed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.generations.load(Ordering::SeqCst), 1);

    let (status, body) = app
        .call(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "raw_content": "Second\nThird" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.generations.load(Ordering::SeqCst), 2);
    assert_eq!(body["note"]["title"], "Renamed");
    assert_eq!(body["note"]["key_points"], json!(["Second", "Third"]));
}

#[tokio::test]
async fn test_notes_are_private_and_deletable() {
    let app = TestApp::new();
    let ada = app.register("ada").await;
    let bob = app.register("bob").await;
    let course_id = app.create_course(&ada, "Biology").await;
    let note = app.create_note(&ada, course_id, "").await;
    let uri = format!("/notes/{}/", note["id"]);

    let (status, _) = app.call("GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("DELETE", &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call("GET", &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_and_search_notes() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let biology = app.create_course(&token, "Biology").await;
    let history = app.create_course(&token, "History").await;
    app.create_note(&token, biology, "Mitochondria").await;
    app.create_note(&token, history, "Roman mitochondria jokes").await;
    app.create_note(&token, history, "Carthage").await;

    let (_, body) = app
        .call("GET", &format!("/notes/?course_id={}", history), Some(&token), None)
        .await;
    assert_eq!(body["count"], 2);

    let (status, body) = app
        .call(
            "POST",
            "/notes/search/",
            Some(&token),
            Some(json!({ "query": "MITOCHONDRIA" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["query"], "MITOCHONDRIA");

    let (_, body) = app
        .call(
            "POST",
            "/notes/search/",
            Some(&token),
            Some(json!({ "query": "mitochondria", "course_id": biology })),
        )
        .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["notes"][0]["course_title"], "Biology");

    let (status, _) = app
        .call("POST", "/notes/search/", Some(&token), Some(json!({ "query": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Audio upload and the audio pipeline
// =============================================================================

#[tokio::test]
async fn test_audio_upload_runs_full_pipeline() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;
    let note = app.create_note(&token, course_id, "").await;
    let note_id = note["id"].as_i64().unwrap();

    let (status, body) = app.upload(&token, note_id, b"opus-bytes").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["note_id"], note_id);
    assert_eq!(body["processing_status"], "completed");

    let stored = app
        .media
        .path()
        .join("audio")
        .join(format!("audio_{}_lecture_one.webm", note_id));
    assert_eq!(std::fs::read(&stored).unwrap(), b"opus-bytes");

    let (_, note) = app
        .call("GET", &format!("/notes/{}/", note_id), Some(&token), None)
        .await;
    assert_eq!(
        note["key_points"],
        json!(["Photosynthesis", "Chlorophyll", "Light reactions"])
    );
    assert_eq!(note["audio_file_path"], stored.to_string_lossy().to_string());

    let (status, body) = app
        .call("GET", &format!("/ai/status/{}/", note_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processing_status"], "completed");
    assert_eq!(body["is_processed"], true);
    assert_eq!(body["has_content"], true);
}

#[tokio::test]
async fn test_audio_upload_replaces_typed_content() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;
    let note = app.create_note(&token, course_id, "Already typed").await;
    let note_id = note["id"].as_i64().unwrap();
    assert_eq!(note["processing_status"], "completed");

    let (status, body) = app.upload(&token, note_id, b"opus-bytes").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["processing_status"], "completed");
    assert_eq!(app.transcriptions.load(Ordering::SeqCst), 1);

    let (_, note) = app
        .call("GET", &format!("/notes/{}/", note_id), Some(&token), None)
        .await;
    assert_eq!(
        note["raw_content"],
        "Photosynthesis\nChlorophyll\nLight reactions"
    );
}

#[tokio::test]
async fn test_audio_upload_retry_after_failed_transcription() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;
    let note = app.create_note(&token, course_id, "").await;
    let note_id = note["id"].as_i64().unwrap();

    let (status, _) = app.upload(&token, note_id, b"bad").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = app.upload(&token, note_id, b"opus-bytes").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["processing_status"], "completed");
    assert_eq!(app.transcriptions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_transcription_failure_marks_note_failed() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let course_id = app.create_course(&token, "Biology").await;
    let note = app.create_note(&token, course_id, "").await;
    let note_id = note["id"].as_i64().unwrap();

    let (status, body) = app.upload(&token, note_id, b"bad").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "TRANSCRIPTION_FAILED");
    assert_eq!(app.generations.load(Ordering::SeqCst), 0);

    let (_, body) = app
        .call("GET", &format!("/ai/status/{}/", note_id), Some(&token), None)
        .await;
    assert_eq!(body["processing_status"], "failed");
    assert_eq!(body["has_content"], false);
}

#[tokio::test]
async fn test_upload_requires_file_and_note_id() {
    let app = TestApp::new();
    let token = app.register("ada").await;

    let request = Request::builder()
        .method("POST")
        .uri("/ai/upload-audio/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"note_id\"\r\n\r\n1\r\n--{b}--\r\n",
            b = BOUNDARY
        )))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid input: No audio file provided");
}
