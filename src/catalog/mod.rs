//! Catalogue search and ranking.
//!
//! - `search`: keyword/tempo/metadata query composition and relevance blend
//! - `similarity`: Ratcliff/Obershelp sequence ratio
//! - `lyrics`: lyrics scoring on top of the ratio
//!
//! `Catalog` ties these to the repository.

pub mod lyrics;
pub mod search;
pub mod similarity;

pub use lyrics::LyricsMatch;
pub use search::SearchFilter;

use crate::db::Repository;
use crate::domain::{Song, SongId};
use crate::error::CatalogError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Songs merged from the lyrics matcher into a combined search.
pub const COMBINED_LYRICS_LIMIT: usize = 5;

/// Search, similarity and recommendation queries over the song catalogue.
pub struct Catalog {
    repo: Arc<Repository>,
}

impl Catalog {
    pub fn new(repo: Arc<Repository>) -> Self {
        Catalog { repo }
    }

    /// Ranked keyword/metadata search. Hits have their query count bumped.
    pub async fn search(&self, filter: &SearchFilter, limit: i64) -> Result<Vec<Song>, sqlx::Error> {
        self.repo.search_songs(filter, limit).await
    }

    /// Songs whose lyrics resemble `query`, best match first.
    pub async fn similarity_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Song>, CatalogError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.repo.lyrics_candidates().await?;
        let considered = candidates.len();
        let query_owned = query.to_string();
        let matches = tokio::task::spawn_blocking(move || lyrics::rank(&query_owned, candidates, limit))
            .await
            .map_err(|e| CatalogError::Ranking(e.to_string()))?;

        debug!(considered, matched = matches.len(), "lyrics similarity search");
        let uuids: Vec<SongId> = matches.into_iter().map(|m| m.uuid).collect();
        Ok(self.repo.songs_by_ids(&uuids).await?)
    }

    /// Keyword search, then lyrics matches appended without duplicates.
    pub async fn combined_search(
        &self,
        filter: &SearchFilter,
        lyrics_query: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Song>, CatalogError> {
        let mut results = self.search(filter, limit).await?;

        if let Some(q) = lyrics_query.filter(|q| !q.trim().is_empty()) {
            let mut seen: HashSet<SongId> = results.iter().map(|s| s.uuid.clone()).collect();
            for song in self.similarity_search(q, COMBINED_LYRICS_LIMIT).await? {
                if seen.insert(song.uuid.clone()) {
                    results.push(song);
                }
            }
        }

        Ok(results)
    }

    /// Most-queried songs.
    pub async fn trending(&self, limit: i64) -> Result<Vec<Song>, sqlx::Error> {
        self.repo.trending_songs(limit).await
    }

    /// Songs similar in category/key and tempo to `uuid`.
    pub async fn recommendations(
        &self,
        uuid: &SongId,
        limit: i64,
    ) -> Result<Vec<Song>, sqlx::Error> {
        self.repo.recommendations(uuid, limit).await
    }
}
