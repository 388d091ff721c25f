//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Stored format is `hex(derived) ‖ hex(salt)`: 64 hex chars of derived key
//! followed by 64 hex chars of salt.

use rand::RngCore;
use sha2::Sha256;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
const KEY_LEN: usize = 32;
const SALT_LEN: usize = 32;

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_password_with_salt(password, &salt)
}

/// Hash `password` with a caller-supplied salt.
pub fn hash_password_with_salt(password: &str, salt: &[u8]) -> String {
    let derived = derive(password, salt);
    format!("{}{}", hex::encode(derived), hex::encode(salt))
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    if stored_hash.len() < KEY_LEN * 2 || !stored_hash.is_char_boundary(KEY_LEN * 2) {
        return false;
    }
    let (hash_hex, salt_hex) = stored_hash.split_at(KEY_LEN * 2);
    let (Ok(expected), Ok(salt)) = (hex::decode(hash_hex), hex::decode(salt_hex)) else {
        return false;
    };
    constant_time_eq(&derive(password, &salt), &expected)
}

fn derive(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut out);
    out
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_layout() {
        let stored = hash_password("SecurePass123!");
        assert_eq!(stored.len(), 128);
        assert!(stored.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_accepts_correct_password() {
        let stored = hash_password("SecurePass123!");
        assert!(verify_password(&stored, "SecurePass123!"));
        assert!(!verify_password(&stored, "securepass123!"));
    }

    #[test]
    fn test_salts_differ_between_calls() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_deterministic_with_fixed_salt() {
        let salt = [7u8; 32];
        assert_eq!(
            hash_password_with_salt("pw", &salt),
            hash_password_with_salt("pw", &salt)
        );
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("", "pw"));
        assert!(!verify_password("zz", "pw"));
        assert!(!verify_password(&"g".repeat(128), "pw"));
        assert!(!verify_password("pbkdf2:sha256:600000$abc$def", "pw"));
    }
}
