use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: String,
    pub upload_dir: String,
    pub session_ttl_hours: i64,
    pub search_limit: i64,
    pub trending_limit: i64,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = env_map
            .get("HOST")
            .map(|s| s.as_str())
            .unwrap_or("127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue("HOST".to_string(), "must be an IP address".to_string())
            })?;

        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let upload_dir = env_map
            .get("UPLOAD_DIR")
            .cloned()
            .unwrap_or_else(|| "uploads".to_string());

        let session_ttl_hours = parse_positive(&env_map, "SESSION_TTL_HOURS", 720)?;
        let search_limit = parse_positive(&env_map, "SEARCH_LIMIT", 20)?;
        let trending_limit = parse_positive(&env_map, "TRENDING_LIMIT", 10)?;
        let max_upload_bytes = parse_positive(&env_map, "MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?;

        Ok(Config {
            host,
            port,
            database_path,
            upload_dir,
            session_ttl_hours,
            search_limit,
            trending_limit,
            max_upload_bytes: max_upload_bytes as usize,
        })
    }

    /// Defaults suitable for tests: everything but the paths.
    pub fn for_paths(database_path: impl Into<String>, upload_dir: impl Into<String>) -> Self {
        Config {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            database_path: database_path.into(),
            upload_dir: upload_dir.into(),
            session_ttl_hours: 720,
            search_limit: 20,
            trending_limit: 10,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

fn parse_positive(
    env_map: &HashMap<String, String>,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ConfigError::InvalidValue(
                key.to_string(),
                "must be a positive integer".to_string(),
            )),
        },
    }
}
