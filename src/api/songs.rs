use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{AppState, CurrentUser};
use crate::domain::{NewSong, Song, SongId, SongPatch};
use crate::error::AppError;

const DEFAULT_RECOMMENDATIONS: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SongsResponse {
    pub songs: Vec<Song>,
    pub count: usize,
}

impl From<Vec<Song>> for SongsResponse {
    fn from(songs: Vec<Song>) -> Self {
        SongsResponse {
            count: songs.len(),
            songs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedSong {
    pub uuid: SongId,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateResponse {
    pub updated: usize,
}

pub(crate) fn parse_song_id(raw: &str) -> Result<SongId, AppError> {
    raw.parse::<SongId>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

fn positive_limit(limit: Option<i64>) -> Result<Option<i64>, AppError> {
    match limit {
        Some(n) if n <= 0 => Err(AppError::BadRequest("limit must be positive".into())),
        other => Ok(other),
    }
}

pub async fn list_songs(
    _user: CurrentUser,
    Query(params): Query<LimitQuery>,
    State(state): State<AppState>,
) -> Result<Json<SongsResponse>, AppError> {
    let limit = positive_limit(params.limit)?;
    let songs = state.repo.list_songs(limit).await?;
    Ok(Json(songs.into()))
}

pub async fn create_song(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(song): Json<NewSong>,
) -> Result<(StatusCode, Json<CreatedSong>), AppError> {
    let uuid = state.repo.insert_song(&song).await?;
    tracing::info!(user_id = %user.id(), uuid = %uuid, "song catalogued");
    Ok((StatusCode::CREATED, Json(CreatedSong { uuid })))
}

/// Create a song from a multipart form.
///
/// Text parts carry the metadata. The `file` part is the audio file and
/// becomes `path`; `img` and `mp3` parts become `img_url` and `mp3_url`.
/// A text `path` part is accepted in place of an uploaded file.
pub async fn upload_song(
    user: CurrentUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedSong>), AppError> {
    let mut stored = Vec::new();
    let result = match read_upload_form(&state, multipart, &mut stored).await {
        Ok(song) => state.repo.insert_song(&song).await.map_err(AppError::from),
        Err(e) => Err(e),
    };
    let uuid = match result {
        Ok(uuid) => uuid,
        Err(e) => {
            state.uploads.discard(&stored).await;
            return Err(e);
        }
    };

    tracing::info!(user_id = %user.id(), uuid = %uuid, "song uploaded");
    Ok((StatusCode::CREATED, Json(CreatedSong { uuid })))
}

/// Store file parts as they arrive, recording each path in `stored`.
async fn read_upload_form(
    state: &AppState,
    mut multipart: Multipart,
    stored: &mut Vec<PathBuf>,
) -> Result<NewSong, AppError> {
    let mut song = NewSong::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if file_name.is_empty() && data.is_empty() {
                continue;
            }
            let path = state.uploads.save(&file_name, &data).await?;
            let location = path.to_string_lossy().into_owned();
            stored.push(path);
            match name.as_str() {
                "file" | "path" => song.path = location,
                "img" | "img_url" | "imgUrl" => song.img_url = Some(location),
                "mp3" | "mp3_url" | "mp3Url" => song.mp3_url = Some(location),
                other => tracing::debug!(field = %other, "ignoring unexpected file part"),
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        apply_form_field(&mut song, &name, value)?;
    }

    Ok(song)
}

fn apply_form_field(song: &mut NewSong, name: &str, value: String) -> Result<(), AppError> {
    let text = || {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };
    let integer = || -> Result<Option<i64>, AppError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} must be an integer", name)))
    };

    match name {
        "song_title" | "songTitle" => song.song_title = value.trim().to_string(),
        "path" => song.path = value.trim().to_string(),
        "tags" => song.tags = text(),
        "music_key" | "musicKey" => song.music_key = text(),
        "author" => song.author = text(),
        "lyrics" => song.lyrics = text(),
        "category" => song.category = text(),
        "source" => song.source = text(),
        "img_url" | "imgUrl" => song.img_url = text(),
        "mp3_url" | "mp3Url" => song.mp3_url = text(),
        "tempo_start" | "tempoStart" => song.tempo_start = integer()?,
        "tempo_end" | "tempoEnd" => song.tempo_end = integer()?,
        _ => {}
    }
    Ok(())
}

pub async fn get_song(
    _user: CurrentUser,
    Path(uuid): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Song>, AppError> {
    let uuid = parse_song_id(&uuid)?;
    state
        .repo
        .get_song(&uuid)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("song not found: {}", uuid)))
}

pub async fn update_song(
    user: CurrentUser,
    Path(uuid): Path<String>,
    State(state): State<AppState>,
    Json(song): Json<NewSong>,
) -> Result<Json<Song>, AppError> {
    let uuid = parse_song_id(&uuid)?;
    state.repo.update_song(&uuid, &song).await?;
    tracing::info!(user_id = %user.id(), uuid = %uuid, "song updated");

    let updated = state
        .repo
        .get_song(&uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("song not found: {}", uuid)))?;
    Ok(Json(updated))
}

pub async fn delete_song(
    user: CurrentUser,
    Path(uuid): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let uuid = parse_song_id(&uuid)?;
    if !state.repo.delete_song(&uuid).await? {
        return Err(AppError::NotFound(format!("song not found: {}", uuid)));
    }
    tracing::info!(user_id = %user.id(), uuid = %uuid, "song deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn batch_update_songs(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(patches): Json<Vec<SongPatch>>,
) -> Result<Json<BatchUpdateResponse>, AppError> {
    let updated = state.repo.batch_update_songs(&patches).await?;
    tracing::info!(requested = patches.len(), updated, "batch song update");
    Ok(Json(BatchUpdateResponse { updated }))
}

pub async fn trending_songs(
    _user: CurrentUser,
    Query(params): Query<LimitQuery>,
    State(state): State<AppState>,
) -> Result<Json<SongsResponse>, AppError> {
    let limit = positive_limit(params.limit)?.unwrap_or(state.config.trending_limit);
    let songs = state.catalog.trending(limit).await?;
    Ok(Json(songs.into()))
}

pub async fn get_recommendations(
    _user: CurrentUser,
    Path(uuid): Path<String>,
    Query(params): Query<LimitQuery>,
    State(state): State<AppState>,
) -> Result<Json<SongsResponse>, AppError> {
    let uuid = parse_song_id(&uuid)?;
    let limit = positive_limit(params.limit)?.unwrap_or(DEFAULT_RECOMMENDATIONS);

    if state.repo.get_song(&uuid).await?.is_none() {
        return Err(AppError::NotFound(format!("song not found: {}", uuid)));
    }
    let songs = state.catalog.recommendations(&uuid, limit).await?;
    Ok(Json(songs.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_song_id_rejects_garbage() {
        assert!(parse_song_id("not-a-uuid").is_err());
        let id = parse_song_id("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();
        assert_eq!(id.as_str(), "6f9619ff-8b86-d011-b42d-00c04fc964ff");
    }

    #[test]
    fn test_form_fields_fill_new_song() {
        let mut song = NewSong::default();
        apply_form_field(&mut song, "song_title", " Dancing Queen ".into()).unwrap();
        apply_form_field(&mut song, "tempoStart", "72".into()).unwrap();
        apply_form_field(&mut song, "tempo_end", "".into()).unwrap();
        apply_form_field(&mut song, "author", "  ".into()).unwrap();

        assert_eq!(song.song_title, "Dancing Queen");
        assert_eq!(song.tempo_start, Some(72));
        assert_eq!(song.tempo_end, None);
        assert_eq!(song.author, None);
        assert!(apply_form_field(&mut song, "tempo_start", "fast".into()).is_err());
    }
}
