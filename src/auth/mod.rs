//! Credential handling: password hashing and session tokens.

pub mod password;

pub use password::{hash_password, verify_password};

use rand::RngCore;

/// Generate an opaque 256-bit bearer token, hex encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Run PBKDF2 hashing off the async executor.
pub async fn hash_password_blocking(password: String) -> Result<String, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await
}

/// Run PBKDF2 verification off the async executor.
pub async fn verify_password_blocking(
    stored_hash: String,
    password: String,
) -> Result<bool, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || verify_password(&stored_hash, &password)).await
}
