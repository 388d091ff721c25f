pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod playlist;
pub mod storage;

pub use catalog::{Catalog, SearchFilter};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    NewSong, PlaylistAction, PlaylistId, PlaylistSummary, Song, SongId, SongPatch, User,
    UserId,
};
pub use error::{AppError, CatalogError, PlaylistError, UserError};
pub use storage::UploadStore;
