//! SQLite storage for users, sessions, songs and playlists.
//!
//! This module provides:
//! - Pool initialisation, pragmas and schema bootstrap
//! - The `Repository` with every parameterised query the service runs

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
