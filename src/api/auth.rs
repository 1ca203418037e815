//! Authentication routes and the bearer-token extractor

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::domain::models::User;
use crate::error::AppError;
use crate::services::password::{self, validate_new_password};
use crate::services::{TokenPair, TokenType};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

/// The user identified by a valid access token
///
/// Rejects with 401 when the header is missing, the token does not verify
/// as an access token, or the user no longer exists or is disabled.
pub struct AuthUser {
    pub id: i64,
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let claims = state
            .tokens
            .verify_token(token, TokenType::Access)
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;
        let id = claims
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("Invalid token subject".to_string()))?;

        let user = state
            .storage
            .get_user(id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("User not found or inactive".to_string()))?;

        Ok(AuthUser { id, user })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Option<i64>,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub created_at: i64,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub tokens: TokenPair,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub user: UserProfile,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_email(email: &str) -> ApiResult<()> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ApiError::bad_request("Enter a valid email address"));
    }
    Ok(())
}

fn validate_username(username: &str) -> ApiResult<()> {
    if username.is_empty() || username.chars().count() > 150 {
        return Err(ApiError::bad_request(
            "Username must be between 1 and 150 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(ApiError::bad_request(
            "Username may only contain letters, digits and @/./+/-/_",
        ));
    }
    Ok(())
}

/// POST /auth/register/
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let email = request.email.trim().to_lowercase();
    let username = request.username.trim().to_string();
    validate_email(&email)?;
    validate_username(&username)?;
    validate_new_password(&request.password, &request.password_confirm)?;

    if state.storage.get_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User with this email already exists".into()).into());
    }
    if state.storage.get_user_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("User with this username already exists".into()).into());
    }

    let password_hash = password::hash(request.password).await?;
    let mut user = User::new(
        email,
        username,
        request.first_name.trim().to_string(),
        request.last_name.trim().to_string(),
        password_hash,
    );
    user.id = Some(state.storage.create_user(&user).await?);
    log::info!("Registered user {}", user.username);

    let tokens = state.tokens.issue_token_pair(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserProfile::from(&user),
            tokens,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// POST /auth/login/
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = request.email.trim().to_lowercase();
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
    let user = state
        .storage
        .get_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;
    if !password::verify(request.password, user.password_hash.clone()).await? {
        return Err(invalid().into());
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("User account is disabled".to_string()).into());
    }

    let tokens = state.tokens.issue_token_pair(&user)?;
    log::info!("User {} logged in", user.username);
    Ok(Json(AuthResponse {
        user: UserProfile::from(&user),
        tokens,
        message: "Login successful".to_string(),
    }))
}

/// POST /auth/refresh/
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = state
        .tokens
        .verify_token(&request.refresh_token, TokenType::Refresh)
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    let user = state
        .storage
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(RefreshResponse {
        tokens: state.tokens.issue_token_pair(&user)?,
        message: "Token refreshed successfully".to_string(),
    }))
}

/// GET /auth/profile/
pub async fn profile(auth: AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&auth.user))
}

/// PUT /auth/profile/update/
///
/// Email is read-only; username, first and last name may change.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileUpdateResponse>> {
    let mut user = auth.user;

    if let Some(username) = request.username {
        let username = username.trim().to_string();
        if username != user.username {
            validate_username(&username)?;
            if state.storage.get_user_by_username(&username).await?.is_some() {
                return Err(
                    AppError::Conflict("User with this username already exists".into()).into(),
                );
            }
            user.username = username;
        }
    }
    if let Some(first_name) = request.first_name {
        user.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = request.last_name {
        user.last_name = last_name.trim().to_string();
    }

    user.updated_at = chrono::Utc::now().timestamp();
    state.storage.update_user(&user).await?;

    Ok(Json(ProfileUpdateResponse {
        user: UserProfile::from(&user),
        message: "Profile updated successfully".to_string(),
    }))
}

/// POST /auth/logout/
///
/// Tokens are stateless; the client discards them.
pub async fn logout(_auth: AuthUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout successful".to_string(),
    })
}
