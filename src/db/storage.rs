//! Key/value document storage beneath the local record stores.
//!
//! Each key holds one whole JSON document (a collection array or the session record). Adapters
//! only move strings around; they never look inside the documents.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::AppError;

/// Whole-document storage keyed by name.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a document. A key that was never written is `Ok(None)`.
    async fn read(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Replace a document.
    async fn write(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Remove a document. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

/// Process-local storage; contents are lost on restart.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.documents
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.documents.write().await.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per document inside a directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a crash mid-write
/// leaves the previous document intact.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::ReadFailure(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        let write_failure =
            |e: std::io::Error| AppError::WriteFailure(format!("Failed to write {}: {}", key, e));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(write_failure)?;

        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));
        tokio::fs::write(&tmp_path, value)
            .await
            .map_err(write_failure)?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(write_failure)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::WriteFailure(format!(
                "Failed to remove {}: {}",
                key, e
            ))),
        }
    }
}
