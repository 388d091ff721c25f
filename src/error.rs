use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::MAX_PLAYLISTS_PER_USER;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Failures of user registration and login.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("username is already taken")]
    DuplicateUsername,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username and password are required")]
    MissingCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Failures of playlist management.
#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("playlist name must not be empty")]
    EmptyName,
    #[error("a playlist with this name already exists")]
    DuplicateName,
    #[error("playlist limit reached ({} per user)", MAX_PLAYLISTS_PER_USER)]
    CapacityExceeded,
    #[error("playlist not found")]
    NotFound,
    #[error("playlist has no songs")]
    Empty,
    #[error("unknown song: {0}")]
    UnknownSong(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Failures of song cataloguing.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("tempo_start must not exceed tempo_end")]
    InvalidTempo,
    #[error("song not found: {0}")]
    NotFound(String),
    #[error("lyrics ranking failed: {0}")]
    Ranking(String),
    #[error("database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        if is_check_violation(&err) {
            CatalogError::InvalidTempo
        } else {
            CatalogError::Db(err)
        }
    }
}

/// True for a SQLite UNIQUE/PRIMARY KEY constraint failure.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True for a SQLite CHECK constraint failure.
pub fn is_check_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_check_violation())
}

/// True for a SQLite FOREIGN KEY constraint failure.
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateUsername => AppError::Conflict(err.to_string()),
            UserError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            UserError::MissingCredentials => AppError::BadRequest(err.to_string()),
            UserError::Hashing(msg) => AppError::Internal(msg),
            UserError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<PlaylistError> for AppError {
    fn from(err: PlaylistError) -> Self {
        match err {
            PlaylistError::EmptyName
            | PlaylistError::CapacityExceeded
            | PlaylistError::Empty
            | PlaylistError::UnknownSong(_) => AppError::BadRequest(err.to_string()),
            PlaylistError::DuplicateName => AppError::Conflict(err.to_string()),
            PlaylistError::NotFound => AppError::NotFound(err.to_string()),
            PlaylistError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingField(_) | CatalogError::InvalidTempo => {
                AppError::BadRequest(err.to_string())
            }
            CatalogError::NotFound(_) => AppError::NotFound(err.to_string()),
            CatalogError::Ranking(_) => AppError::Internal(err.to_string()),
            CatalogError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<crate::playlist::PlaylistExportError> for AppError {
    fn from(err: crate::playlist::PlaylistExportError) -> Self {
        match err {
            crate::playlist::PlaylistExportError::Playlist(e) => e.into(),
            crate::playlist::PlaylistExportError::Export(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<crate::storage::StorageError> for AppError {
    fn from(err: crate::storage::StorageError) -> Self {
        match err {
            crate::storage::StorageError::EmptyFileName => AppError::BadRequest(err.to_string()),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_errors_map_to_status() {
        let resp = AppError::from(UserError::DuplicateUsername).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = AppError::from(UserError::InvalidCredentials).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_playlist_errors_map_to_status() {
        let resp = AppError::from(PlaylistError::CapacityExceeded).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = AppError::from(PlaylistError::DuplicateName).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = AppError::from(PlaylistError::NotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_panicked_blocking_work_is_internal_error() {
        let join_err = tokio::task::spawn_blocking(|| -> bool { panic!("ranking blew up") })
            .await
            .unwrap_err();

        let resp = AppError::from(UserError::Hashing(join_err.to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let resp = AppError::from(CatalogError::Ranking(join_err.to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_capacity_message_names_limit() {
        assert!(PlaylistError::CapacityExceeded.to_string().contains("50"));
    }
}
