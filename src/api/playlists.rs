use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::songs::parse_song_id;
use super::{AppState, CurrentUser};
use crate::domain::{PlaylistAction, PlaylistId, PlaylistSummary, Song, SongId};
use crate::error::{AppError, PlaylistError};
use crate::playlist;

#[derive(Debug, Deserialize)]
pub struct PlaylistNameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSongsRequest {
    pub song_uuid: Option<String>,
    #[serde(default)]
    pub song_uuids: Vec<String>,
}

impl AddSongsRequest {
    fn song_ids(&self) -> Result<Vec<SongId>, AppError> {
        let ids = self
            .song_uuid
            .iter()
            .chain(self.song_uuids.iter())
            .map(|raw| parse_song_id(raw))
            .collect::<Result<Vec<_>, _>>()?;
        if ids.is_empty() {
            return Err(AppError::BadRequest("songUuid or songUuids is required".into()));
        }
        Ok(ids)
    }
}

#[derive(Debug, Serialize)]
pub struct PlaylistsResponse {
    pub playlists: Vec<PlaylistSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPlaylist {
    pub playlist_id: PlaylistId,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PlaylistDetail {
    pub playlist: PlaylistSummary,
    pub songs: Vec<Song>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub affected_rows: u64,
}

fn parse_playlist_id(raw: &str) -> Result<PlaylistId, AppError> {
    raw.trim()
        .parse::<i64>()
        .map(PlaylistId::new)
        .map_err(|_| AppError::BadRequest(format!("invalid playlist id: {}", raw)))
}

/// Resolve a playlist the current user owns. Someone else's playlist is
/// reported as missing.
async fn owned_playlist(
    state: &AppState,
    user: &CurrentUser,
    raw_id: &str,
) -> Result<PlaylistSummary, AppError> {
    let playlist_id = parse_playlist_id(raw_id)?;
    state
        .repo
        .get_playlist(user.id(), playlist_id)
        .await?
        .ok_or_else(|| PlaylistError::NotFound.into())
}

pub async fn list_playlists(
    user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PlaylistsResponse>, AppError> {
    let playlists = state.repo.list_playlists(user.id()).await?;
    Ok(Json(PlaylistsResponse { playlists }))
}

pub async fn create_playlist(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<PlaylistNameRequest>,
) -> Result<(StatusCode, Json<CreatedPlaylist>), AppError> {
    let playlist_id = state.repo.create_playlist(user.id(), &body.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedPlaylist {
            playlist_id,
            name: body.name.trim().to_string(),
        }),
    ))
}

pub async fn get_playlist(
    user: CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PlaylistDetail>, AppError> {
    let playlist = owned_playlist(&state, &user, &id).await?;
    let songs = state.repo.playlist_songs(playlist.playlist_id, None).await?;
    Ok(Json(PlaylistDetail { playlist, songs }))
}

pub async fn rename_playlist(
    user: CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<PlaylistNameRequest>,
) -> Result<Json<PlaylistSummary>, AppError> {
    let playlist_id = parse_playlist_id(&id)?;
    state
        .repo
        .rename_playlist(user.id(), playlist_id, &body.name)
        .await?;
    let renamed = owned_playlist(&state, &user, &id).await?;
    Ok(Json(renamed))
}

pub async fn delete_playlist(
    user: CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let playlist_id = parse_playlist_id(&id)?;
    if !state.repo.delete_playlist(user.id(), playlist_id).await? {
        return Err(PlaylistError::NotFound.into());
    }
    tracing::info!(user_id = %user.id(), playlist_id = %playlist_id, "playlist deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_songs(
    user: CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<AddSongsRequest>,
) -> Result<Json<MembershipResponse>, AppError> {
    let song_ids = body.song_ids()?;
    let playlist = owned_playlist(&state, &user, &id).await?;

    let affected_rows = state
        .repo
        .manage_playlist_songs(playlist.playlist_id, &song_ids, PlaylistAction::Add)
        .await?;
    Ok(Json(MembershipResponse { affected_rows }))
}

pub async fn remove_song(
    user: CurrentUser,
    Path((id, uuid)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<MembershipResponse>, AppError> {
    let song_id = parse_song_id(&uuid)?;
    let playlist = owned_playlist(&state, &user, &id).await?;

    let affected_rows = state
        .repo
        .manage_playlist_songs(playlist.playlist_id, &[song_id], PlaylistAction::Remove)
        .await?;
    Ok(Json(MembershipResponse { affected_rows }))
}

pub async fn export_playlist(
    user: CurrentUser,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let playlist_id = parse_playlist_id(&id)?;
    let export =
        playlist::export_playlist(&state.repo, user.id(), playlist_id, state.uploads.root())
            .await?;

    let disposition = HeaderValue::from_str(&content_disposition(&export.download_name))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.archive.bytes,
    )
        .into_response())
}

/// `attachment` header value with an ASCII fallback name and an RFC 5987
/// `filename*` carrying the full UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            c if c.is_ascii_graphic() && c != '"' && c != '\\' && c != '%' => c,
            ' ' => ' ',
            _ => '_',
        })
        .collect();

    let encoded: String = file_name
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
