//! In-memory ZIP export of a playlist's song files.

use crate::domain::Song;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export task failed: {0}")]
    Task(String),
}

/// A finished archive plus what went into it.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    pub bytes: Vec<u8>,
    pub file_count: usize,
    /// Stored paths that were missing or resolved outside the upload root.
    pub skipped: Vec<String>,
}

/// Make a playlist name safe to use as an archive folder and download name.
pub fn archive_folder_name(playlist_name: &str) -> String {
    let cleaned: String = playlist_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "playlist".to_string(),
        s => s.to_string(),
    }
}

/// Resolve a stored song path, following symlinks, and keep it only if it
/// names a regular file under `root`.
fn resolve_under(root: Option<&Path>, stored: &str) -> Option<PathBuf> {
    let root = root?;
    if stored.trim().is_empty() {
        return None;
    }
    let resolved = Path::new(stored).canonicalize().ok()?;
    (resolved.starts_with(root) && resolved.is_file()).then_some(resolved)
}

/// Zip every existing song file under `<playlist name>/<file name>`.
///
/// Only files inside `upload_root` are read. Anything missing or outside
/// it is skipped. Two songs with the same file name get numbered prefixes
/// so neither entry is lost.
pub fn build_archive(
    upload_root: &Path,
    playlist_name: &str,
    songs: &[Song],
) -> Result<ExportArchive, ExportError> {
    let folder = archive_folder_name(playlist_name);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let root = upload_root.canonicalize().ok();

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut used_names: HashSet<String> = HashSet::new();
    let mut skipped = Vec::new();
    let mut file_count = 0usize;

    for song in songs {
        let Some(path) = resolve_under(root.as_deref(), &song.path) else {
            warn!(uuid = %song.uuid, path = %song.path, "export skipped file missing or outside upload root");
            skipped.push(song.path.clone());
            continue;
        };

        let file_name = Path::new(&song.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| song.uuid.to_string());
        let mut entry = format!("{}/{}", folder, file_name);
        let mut n = 2;
        while !used_names.insert(entry.clone()) {
            entry = format!("{}/{}_{}", folder, n, file_name);
            n += 1;
        }

        let data = std::fs::read(&path)?;
        writer.start_file(entry, options)?;
        writer.write_all(&data)?;
        file_count += 1;
    }

    let bytes = writer.finish()?.into_inner();
    Ok(ExportArchive {
        bytes,
        file_count,
        skipped,
    })
}
