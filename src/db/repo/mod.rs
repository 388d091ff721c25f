//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `songs.rs` - Song catalogue writes, lookups and ranked search
//! - `playlists.rs` - Playlist ownership, capacity and membership
//!
//! User and session operations live here.

mod playlists;
mod songs;

pub use songs::SONG_COLUMNS;

use crate::auth;
use crate::domain::{Session, User, UserId};
use crate::error::{is_unique_violation, UserError};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

/// Repository for database operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// The underlying pool, for ad hoc queries in tests and tooling.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // User operations
    // =========================================================================

    /// Register a new user with a PBKDF2-hashed password.
    ///
    /// # Errors
    /// `DuplicateUsername` when the name is taken, `MissingCredentials` when
    /// either field is blank.
    pub async fn register_user(&self, username: &str, password: &str) -> Result<UserId, UserError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(UserError::MissingCredentials);
        }

        let password_hash = auth::hash_password_blocking(password.to_string())
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))?;

        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(&password_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                let user_id = UserId::new(done.last_insert_rowid());
                info!(user_id = %user_id, username = %username, "user registered");
                Ok(user_id)
            }
            Err(e) if is_unique_violation(&e) => Err(UserError::DuplicateUsername),
            Err(e) => Err(UserError::Db(e)),
        }
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords yield the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, UserError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(UserError::MissingCredentials);
        }

        let row = sqlx::query(
            "SELECT user_id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(username = %username, "login for unknown user");
            return Err(UserError::InvalidCredentials);
        };

        let stored: String = row.get("password_hash");
        let verified = auth::verify_password_blocking(stored, password.to_string())
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))?;
        if !verified {
            debug!(username = %username, "login with wrong password");
            return Err(UserError::InvalidCredentials);
        }

        Ok(user_from_row(&row))
    }

    /// Fetch a user by id.
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT user_id, username, created_at FROM users WHERE user_id = ?")
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    // =========================================================================
    // Session operations
    // =========================================================================

    /// Issue a session token for `user_id` valid for `ttl_hours`.
    pub async fn create_session(
        &self,
        user_id: UserId,
        ttl_hours: i64,
    ) -> Result<Session, sqlx::Error> {
        let now = chrono::Utc::now().timestamp();
        let session = Session {
            token: auth::generate_session_token(),
            user_id,
            expires_at: now + ttl_hours * 3600,
        };

        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(&session.token)
            .bind(user_id.as_i64())
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;

        let purged = self.purge_expired_sessions(now).await?;
        if purged > 0 {
            debug!(purged, "expired sessions removed");
        }

        Ok(session)
    }

    /// Resolve a bearer token to its user id, ignoring expired sessions.
    pub async fn session_user_id(&self, token: &str) -> Result<Option<UserId>, sqlx::Error> {
        let user_id: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM sessions WHERE token = ? AND expires_at > ?")
                .bind(token)
                .bind(chrono::Utc::now().timestamp())
                .fetch_optional(&self.pool)
                .await?;

        Ok(user_id.map(UserId::new))
    }

    /// Delete a session. Returns whether a row was removed.
    pub async fn delete_session(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every session that expired at or before `now_secs`.
    pub async fn purge_expired_sessions(&self, now_secs: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now_secs)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        user_id: UserId::new(row.get("user_id")),
        username: row.get("username"),
        created_at: row.get::<Option<String>, _>("created_at").unwrap_or_default(),
    }
}
