//! Upload storage: files land in one flat directory under randomized names.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("uploaded file has no name")]
    EmptyFileName,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded files into the configured upload directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        UploadStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save `data` as `<uuid>_<sanitized original name>` and return the full path.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        if original_name.trim().is_empty() {
            return Err(StorageError::EmptyFileName);
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let stored_name = format!("{}_{}", uuid::Uuid::new_v4(), secure_file_name(original_name));
        let path = self.root.join(stored_name);
        tokio::fs::write(&path, data).await?;

        info!(path = %path.display(), bytes = data.len(), "upload stored");
        Ok(path)
    }

    /// Remove files written by a request that did not complete.
    pub async fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => info!(path = %path.display(), "discarded orphaned upload"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to discard upload"),
            }
        }
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`, without any
/// directory part or leading dots.
pub fn secure_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .trim()
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(|c: char| c == '.' || c == '_').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        cleaned
    }
}
