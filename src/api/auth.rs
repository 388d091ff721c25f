use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{User, UserId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub status: &'static str,
    pub user_id: UserId,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
    pub user_id: UserId,
    pub username: String,
}

/// The user behind the request's bearer token.
///
/// Extracting this is what makes a handler require login: a missing,
/// unknown or expired token rejects the request with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> UserId {
        self.user.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

        let user_id = state
            .repo
            .session_user_id(&token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid or expired session".into()))?;

        // sessions cascade with their user, so a miss here is a race with deletion
        let user = state
            .repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("user no longer exists".into()))?;

        Ok(CurrentUser { user, token })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user_id = state.repo.register_user(&body.username, &body.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            status: "success",
            user_id,
            message: "registration successful".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state.repo.authenticate(&body.username, &body.password).await?;
    let session = state
        .repo
        .create_session(user.user_id, state.config.session_ttl_hours)
        .await?;

    tracing::info!(user_id = %user.user_id, "user logged in");
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user_id: user.user_id,
        username: user.username,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    state.repo.delete_session(&current.token).await?;
    tracing::info!(user_id = %current.id(), "user logged out");
    Ok(Json(serde_json::json!({"status": "success", "message": "logged out"})))
}

pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}
