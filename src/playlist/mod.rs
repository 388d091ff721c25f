//! Playlist export.

pub mod export;

pub use export::{archive_folder_name, build_archive, ExportArchive, ExportError};

use crate::db::Repository;
use crate::domain::{PlaylistId, UserId};
use crate::error::PlaylistError;
use std::path::Path;
use tracing::info;

/// A downloadable playlist archive.
#[derive(Debug, Clone)]
pub struct PlaylistExport {
    pub download_name: String,
    pub archive: ExportArchive,
}

#[derive(Debug, thiserror::Error)]
pub enum PlaylistExportError {
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<sqlx::Error> for PlaylistExportError {
    fn from(err: sqlx::Error) -> Self {
        PlaylistExportError::Playlist(PlaylistError::Db(err))
    }
}

/// Zip the files of a playlist owned by `user_id`. Only files stored under
/// `upload_root` are included.
///
/// # Errors
/// `NotFound` when the playlist is missing or owned by someone else,
/// `Empty` when it has no songs.
pub async fn export_playlist(
    repo: &Repository,
    user_id: UserId,
    playlist_id: PlaylistId,
    upload_root: &Path,
) -> Result<PlaylistExport, PlaylistExportError> {
    let playlist = repo
        .get_playlist(user_id, playlist_id)
        .await?
        .ok_or(PlaylistError::NotFound)?;

    let songs = repo.playlist_songs(playlist_id, None).await?;
    if songs.is_empty() {
        return Err(PlaylistError::Empty.into());
    }

    let name = playlist.name.clone();
    let root = upload_root.to_path_buf();
    let archive = tokio::task::spawn_blocking(move || build_archive(&root, &name, &songs))
        .await
        .map_err(|e| ExportError::Task(e.to_string()))??;

    info!(
        playlist_id = %playlist_id,
        files = archive.file_count,
        skipped = archive.skipped.len(),
        bytes = archive.bytes.len(),
        "playlist exported"
    );

    Ok(PlaylistExport {
        download_name: format!("{}.zip", archive_folder_name(&playlist.name)),
        archive,
    })
}
