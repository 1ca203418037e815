//! Course routes

use crate::api::auth::AuthUser;
use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::domain::models::{Course, DEFAULT_COURSE_COLOR};
use crate::error::AppError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

const TITLE_MIN_CHARS: usize = 2;
const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseView {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub color: String,
    pub notes_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CourseView {
    fn new(course: Course, notes_count: i64) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            color: course.color,
            notes_count,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub course: CourseView,
    pub message: String,
}

fn validate_title(title: &str) -> ApiResult<String> {
    let title = title.trim();
    let len = title.chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        return Err(ApiError::bad_request(format!(
            "Course title must be between {} and {} characters",
            TITLE_MIN_CHARS, TITLE_MAX_CHARS
        )));
    }
    Ok(title.to_string())
}

/// Accepts `#RRGGBB` hex colors
fn validate_color(color: &str) -> ApiResult<String> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ApiError::bad_request(
            "Color must be a hex code like #3B82F6",
        ));
    }
    Ok(color.to_string())
}

/// Title must be unique among the user's other courses
async fn ensure_title_free(
    state: &AppState,
    user_id: i64,
    title: &str,
    current: Option<i64>,
) -> ApiResult<()> {
    if let Some(existing) = state.storage.find_course_by_title(user_id, title).await? {
        if existing.id != current {
            return Err(
                AppError::Conflict("You already have a course with this title".into()).into(),
            );
        }
    }
    Ok(())
}

/// Load a course owned by `user_id`; other users' courses are reported missing
pub(crate) async fn owned_course(state: &AppState, user_id: i64, id: i64) -> ApiResult<Course> {
    state
        .storage
        .get_course(id)
        .await?
        .filter(|course| course.user_id == user_id)
        .ok_or_else(|| ApiError::not_found(format!("Course {}", id)))
}

async fn view(state: &AppState, course: Course) -> ApiResult<CourseView> {
    let notes_count = match course.id {
        Some(id) => state.storage.count_notes(id).await?,
        None => 0,
    };
    Ok(CourseView::new(course, notes_count))
}

/// GET /courses/
pub async fn list_courses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<CourseListResponse>> {
    let courses = state.storage.list_courses(auth.id).await?;
    let mut views = Vec::with_capacity(courses.len());
    for course in courses {
        views.push(view(&state, course).await?);
    }
    Ok(Json(CourseListResponse {
        count: views.len(),
        courses: views,
    }))
}

/// POST /courses/
pub async fn create_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<CourseResponse>)> {
    let title = validate_title(&request.title)?;
    let color = match request.color {
        Some(color) => validate_color(&color)?,
        None => DEFAULT_COURSE_COLOR.to_string(),
    };
    ensure_title_free(&state, auth.id, &title, None).await?;

    let mut course = Course::new(auth.id, title)
        .with_description(request.description.trim().to_string())
        .with_color(color);
    course.id = Some(state.storage.create_course(&course).await?);
    log::info!("User {} created course {:?}", auth.id, course.id);

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            course: CourseView::new(course, 0),
            message: "Course created successfully".to_string(),
        }),
    ))
}

/// GET /courses/{id}/
pub async fn get_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<CourseView>> {
    let course = owned_course(&state, auth.id, id).await?;
    Ok(Json(view(&state, course).await?))
}

/// PUT /courses/{id}/
pub async fn update_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCourseRequest>,
) -> ApiResult<Json<CourseResponse>> {
    let mut course = owned_course(&state, auth.id, id).await?;

    if let Some(title) = request.title {
        let title = validate_title(&title)?;
        ensure_title_free(&state, auth.id, &title, course.id).await?;
        course.title = title;
    }
    if let Some(description) = request.description {
        course.description = description.trim().to_string();
    }
    if let Some(color) = request.color {
        course.color = validate_color(&color)?;
    }

    course.updated_at = chrono::Utc::now().timestamp();
    state.storage.update_course(&course).await?;

    Ok(Json(CourseResponse {
        course: view(&state, course).await?,
        message: "Course updated successfully".to_string(),
    }))
}

/// DELETE /courses/{id}/
///
/// Removes the course's notes as well.
pub async fn delete_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    owned_course(&state, auth.id, id).await?;
    state.storage.delete_course(id).await?;
    log::info!("User {} deleted course {}", auth.id, id);
    Ok(StatusCode::NO_CONTENT)
}
