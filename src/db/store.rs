//! The CRUD contract every record store backend implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::DirectoryRecord;

/// Builds an update from the current state of a record.
pub type RecordEdit<R> =
    Box<dyn FnOnce(&R) -> Result<<R as DirectoryRecord>::Update, AppError> + Send>;

/// CRUD over one flat collection of records.
///
/// Reads never fail because of unreadable or corrupt backing data: such a collection is
/// reported as empty. Mutations surface `WriteFailure` when the new state could not be
/// persisted.
#[async_trait]
pub trait RecordStore<R: DirectoryRecord>: Send + Sync {
    /// All records in stored order.
    async fn list(&self) -> Result<Vec<R>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<R>, AppError>;

    /// Assign an id, append and persist.
    async fn create(&self, request: R::Create) -> Result<R, AppError>;

    /// Shallow-merge `update` over the stored record. `NotFound` if the id is absent.
    async fn update(&self, id: i64, update: R::Update) -> Result<R, AppError>;

    /// Read-modify-write of one record: `edit` sees the stored record and returns the update
    /// to merge. An error from `edit` aborts without writing.
    ///
    /// The default reads then updates; stores that can hold a lock across both override it.
    async fn update_with(&self, id: i64, edit: RecordEdit<R>) -> Result<R, AppError> {
        let record = self.get(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} {} not found", R::ROLE.label(), id))
        })?;
        let update = edit(&record)?;
        self.update(id, update).await
    }

    /// Remove the record. Returns whether it existed; a missing id is not an error.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// Outcome of a delete, as reported over HTTP.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted: bool,
}
