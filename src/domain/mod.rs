//! Domain types for the music library.
//!
//! This module provides:
//! - Identifier primitives: UserId, PlaylistId, SongId
//! - Song rows plus the insert and batch-patch shapes
//! - Playlists, users and sessions

pub mod playlist;
pub mod primitives;
pub mod song;
pub mod user;

pub use playlist::{PlaylistAction, PlaylistSummary, MAX_PLAYLISTS_PER_USER};
pub use primitives::{PlaylistId, SongId, SongIdParseError, UserId};
pub use song::{FieldValue, NewSong, Song, SongField, SongPatch};
pub use user::{Session, User};
