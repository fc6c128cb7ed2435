//! Configuration module for the CropLink backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AppError;

/// Which adapter backs the record stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map, lost on restart
    Memory,
    /// One JSON file per collection under the data directory
    File,
    /// Key/value table in a SQLite database
    Sqlite,
    /// Another CropLink instance reached over HTTP
    Remote,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "remote" => Ok(StoreBackend::Remote),
            other => Err(AppError::Config(format!(
                "Unknown store backend '{}' (expected memory, file, sqlite or remote)",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Record store backend
    pub store: StoreBackend,
    /// Directory for the file backend
    pub data_dir: PathBuf,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Base URL of the upstream instance for the remote backend
    pub remote_url: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let store = env::var("CROPLINK_STORE")
            .unwrap_or_else(|_| "file".to_string())
            .parse()?;

        let data_dir = env::var("CROPLINK_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let db_path = env::var("CROPLINK_DB_PATH")
            .unwrap_or_else(|_| "./data/croplink.sqlite".to_string())
            .into();

        let remote_url = env::var("CROPLINK_REMOTE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let bind_addr = env::var("CROPLINK_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid CROPLINK_BIND_ADDR: {}", e)))?;

        let log_level = env::var("CROPLINK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        if store == StoreBackend::Remote && remote_url.is_none() {
            return Err(AppError::Config(
                "CROPLINK_REMOTE_URL is required for the remote store".to_string(),
            ));
        }

        Ok(Self {
            store,
            data_dir,
            db_path,
            remote_url,
            bind_addr,
            log_level,
        })
    }
}
