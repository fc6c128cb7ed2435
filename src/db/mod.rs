//! Persistence for the directory.
//!
//! Record stores sit on top of a whole-document [`Storage`] adapter (memory, JSON files or
//! SQLite), or forward to another instance over HTTP.

mod collection;
mod remote;
mod repository;
mod sqlite;
mod storage;
mod store;

pub use collection::JsonCollection;
pub use remote::RemoteStore;
pub use repository::{RecordSource, Repository};
pub use sqlite::{init_database, SqliteStorage};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{DeleteResult, RecordEdit, RecordStore};
