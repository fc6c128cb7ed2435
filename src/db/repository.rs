//! Repository tying the two directory collections and the session together.
//!
//! Handlers only see [`RecordStore`] trait objects, so the backend chosen at startup is
//! invisible above this layer.

use std::sync::Arc;

use reqwest::Client;

use super::{
    init_database, FileStorage, JsonCollection, MemoryStorage, RecordStore, RemoteStore,
    SqliteStorage, Storage,
};
use crate::config::{Config, StoreBackend};
use crate::errors::AppError;
use crate::models::{DirectoryRecord, Distributor, Farmer};
use crate::session::SessionStore;

/// Access to every collection plus the session.
pub struct Repository {
    farmers: Arc<dyn RecordStore<Farmer>>,
    distributors: Arc<dyn RecordStore<Distributor>>,
    session: SessionStore,
}

/// Resolves the store for a record type, letting generic handlers reach the right collection.
pub trait RecordSource<R: DirectoryRecord> {
    fn source(&self) -> &dyn RecordStore<R>;
}

impl RecordSource<Farmer> for Repository {
    fn source(&self) -> &dyn RecordStore<Farmer> {
        self.farmers.as_ref()
    }
}

impl RecordSource<Distributor> for Repository {
    fn source(&self) -> &dyn RecordStore<Distributor> {
        self.distributors.as_ref()
    }
}

impl Repository {
    pub fn new(
        farmers: Arc<dyn RecordStore<Farmer>>,
        distributors: Arc<dyn RecordStore<Distributor>>,
        session: SessionStore,
    ) -> Self {
        Self {
            farmers,
            distributors,
            session,
        }
    }

    /// Both collections and the session kept as documents in one storage adapter.
    pub async fn local(storage: Arc<dyn Storage>) -> Self {
        Self::new(
            Arc::new(JsonCollection::<Farmer>::new(storage.clone())),
            Arc::new(JsonCollection::<Distributor>::new(storage.clone())),
            SessionStore::load(storage).await,
        )
    }

    /// Build the repository for the configured backend.
    pub async fn open(config: &Config) -> Result<Self, AppError> {
        match config.store {
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store; data is lost on restart");
                Ok(Self::local(Arc::new(MemoryStorage::new())).await)
            }
            StoreBackend::File => {
                let storage = FileStorage::new(&config.data_dir);
                tracing::info!("Using file store in {}", storage.dir().display());
                Ok(Self::local(Arc::new(storage)).await)
            }
            StoreBackend::Sqlite => {
                tracing::info!("Using SQLite store at {}", config.db_path.display());
                let pool = init_database(&config.db_path).await.map_err(|e| {
                    AppError::Config(format!(
                        "Failed to open database {}: {}",
                        config.db_path.display(),
                        e
                    ))
                })?;
                Ok(Self::local(Arc::new(SqliteStorage::new(pool))).await)
            }
            StoreBackend::Remote => {
                let base_url = config.remote_url.as_deref().ok_or_else(|| {
                    AppError::Config(
                        "CROPLINK_REMOTE_URL is required for the remote store".to_string(),
                    )
                })?;
                tracing::info!("Forwarding records to {}", base_url);

                let client = Client::new();
                // The session belongs to this instance, not the upstream one
                let session_storage: Arc<dyn Storage> =
                    Arc::new(FileStorage::new(&config.data_dir));

                Ok(Self::new(
                    Arc::new(RemoteStore::<Farmer>::new(client.clone(), base_url)),
                    Arc::new(RemoteStore::<Distributor>::new(client, base_url)),
                    SessionStore::load(session_storage).await,
                ))
            }
        }
    }

    pub fn farmers(&self) -> &dyn RecordStore<Farmer> {
        self.farmers.as_ref()
    }

    pub fn distributors(&self) -> &dyn RecordStore<Distributor> {
        self.distributors.as_ref()
    }

    /// The store for `R`.
    pub fn records<R: DirectoryRecord>(&self) -> &dyn RecordStore<R>
    where
        Self: RecordSource<R>,
    {
        <Self as RecordSource<R>>::source(self)
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }
}
