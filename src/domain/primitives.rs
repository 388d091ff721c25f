//! Domain primitives: UserId, PlaylistId, SongId.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Numeric user identifier (`users.user_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a UserId from a row id.
    pub fn new(id: i64) -> Self {
        UserId(id)
    }

    /// Get the underlying row id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric playlist identifier (`playlists.playlist_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub i64);

impl PlaylistId {
    /// Create a PlaylistId from a row id.
    pub fn new(id: i64) -> Self {
        PlaylistId(id)
    }

    /// Get the underlying row id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Song primary key: a hyphenated UUID string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid song id: {0}")]
pub struct SongIdParseError(pub String);

impl SongId {
    /// Wrap an id read back from the database.
    pub fn new(id: String) -> Self {
        SongId(id)
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        SongId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SongId {
    type Err = SongIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = uuid::Uuid::parse_str(s.trim())
            .map_err(|_| SongIdParseError(s.to_string()))?;
        Ok(SongId(parsed.hyphenated().to_string()))
    }
}

impl std::fmt::Display for SongId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
