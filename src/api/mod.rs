pub mod auth;
pub mod health;
pub mod playlists;
pub mod search;
pub mod songs;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::db::Repository;
use crate::storage::UploadStore;
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub use auth::CurrentUser;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub catalog: Arc<Catalog>,
    pub uploads: UploadStore,
    pub config: Config,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        Self {
            catalog: Arc::new(Catalog::new(repo.clone())),
            uploads: UploadStore::new(config.upload_dir.clone()),
            repo,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/auth/logout", post(auth::logout))
        .route("/v1/auth/me", get(auth::me))
        .route("/v1/songs", get(songs::list_songs).post(songs::create_song))
        .route(
            "/v1/songs/upload",
            post(songs::upload_song).layer(upload_limit),
        )
        .route("/v1/songs/batch", post(songs::batch_update_songs))
        .route("/v1/songs/trending", get(songs::trending_songs))
        .route(
            "/v1/songs/:uuid",
            get(songs::get_song)
                .put(songs::update_song)
                .delete(songs::delete_song),
        )
        .route(
            "/v1/songs/:uuid/recommendations",
            get(songs::get_recommendations),
        )
        .route("/v1/search", get(search::search))
        .route("/v1/search/lyrics", get(search::search_lyrics))
        .route(
            "/v1/playlists",
            get(playlists::list_playlists).post(playlists::create_playlist),
        )
        .route(
            "/v1/playlists/:id",
            get(playlists::get_playlist)
                .patch(playlists::rename_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/v1/playlists/:id/songs", post(playlists::add_songs))
        .route(
            "/v1/playlists/:id/songs/:uuid",
            delete(playlists::remove_song),
        )
        .route("/v1/playlists/:id/export", get(playlists::export_playlist))
        .layer(cors)
        .with_state(state)
}
