//! Playlists and playlist membership.

use crate::domain::{PlaylistId, UserId};
use serde::{Deserialize, Serialize};

/// Hard cap on playlists owned by one user.
pub const MAX_PLAYLISTS_PER_USER: i64 = 50;

/// A playlist row together with its membership count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub playlist_id: PlaylistId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: String,
    pub song_count: i64,
}

/// Membership change applied by `Repository::manage_playlist_songs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistAction {
    Add,
    Remove,
}

impl std::fmt::Display for PlaylistAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaylistAction::Add => write!(f, "add"),
            PlaylistAction::Remove => write!(f, "remove"),
        }
    }
}
