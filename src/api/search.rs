use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{AppState, CurrentUser};
use crate::catalog::SearchFilter;
use crate::domain::Song;
use crate::error::AppError;

const DEFAULT_LYRICS_LIMIT: usize = 5;

/// Query string of `/v1/search`. Tempo bounds are taken as text so that a
/// malformed bound drops the tempo filter instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub music_key: Option<String>,
    pub tempo_start: Option<String>,
    pub tempo_end: Option<String>,
    pub lyrics: Option<String>,
    pub limit: Option<i64>,
}

impl SearchParams {
    fn filter(&self) -> SearchFilter {
        let (min_tempo, max_tempo) = tempo_bounds(self.tempo_start.as_deref(), self.tempo_end.as_deref());
        SearchFilter {
            term: self.q.clone(),
            min_tempo,
            max_tempo,
            category: self.category.clone(),
            author: self.author.clone(),
            music_key: self.music_key.clone(),
        }
    }
}

/// Parse both tempo bounds; if either present bound is not an integer,
/// neither is applied.
fn tempo_bounds(start: Option<&str>, end: Option<&str>) -> (Option<i64>, Option<i64>) {
    let parse = |raw: Option<&str>| -> Result<Option<i64>, ()> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s.parse().map(Some).map_err(|_| ()),
        }
    };
    match (parse(start), parse(end)) {
        (Ok(min), Ok(max)) => (min, max),
        _ => (None, None),
    }
}

#[derive(Debug, Deserialize)]
pub struct LyricsParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<Song>,
    pub count: usize,
}

impl From<Vec<Song>> for SearchResponse {
    fn from(results: Vec<Song>) -> Self {
        SearchResponse {
            count: results.len(),
            results,
        }
    }
}

pub async fn search(
    _user: CurrentUser,
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
) -> Result<Json<SearchResponse>, AppError> {
    let limit = match params.limit {
        Some(n) if n <= 0 => return Err(AppError::BadRequest("limit must be positive".into())),
        Some(n) => n,
        None => state.config.search_limit,
    };

    let filter = params.filter();
    let results = state
        .catalog
        .combined_search(&filter, params.lyrics.as_deref(), limit)
        .await?;

    tracing::debug!(hits = results.len(), "search served");
    Ok(Json(results.into()))
}

pub async fn search_lyrics(
    _user: CurrentUser,
    Query(params): Query<LyricsParams>,
    State(state): State<AppState>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(AppError::BadRequest("q is required".into()));
    }
    let limit = params.limit.filter(|n| *n > 0).unwrap_or(DEFAULT_LYRICS_LIMIT);

    let results = state.catalog.similarity_search(&query, limit).await?;
    Ok(Json(results.into()))
}
