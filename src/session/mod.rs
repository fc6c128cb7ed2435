//! Active role and profile of the user driving this instance.
//!
//! The session is a single small record persisted through the same storage adapter as the
//! collections. Transitions report where the front-end should navigate instead of navigating.

use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use tokio::sync::RwLock;

use crate::db::Storage;
use crate::errors::AppError;
use crate::models::{deserialize_nullable, Role};

/// Storage key of the persisted session record.
pub const SESSION_KEY: &str = "croplink-session";

/// Who is using the app and which profile is theirs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub active_id: Option<i64>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.active_id.is_none()
    }
}

/// Where the front-end should go after a session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Dashboard(Role),
    Root,
}

impl Navigation {
    pub fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(role) => Navigation::Dashboard(role),
            None => Navigation::Root,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Navigation::Dashboard(role) => role.dashboard_path(),
            Navigation::Root => "/",
        }
    }
}

impl Serialize for Navigation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

/// Fields to change. An absent field is kept; an explicit `null` clears it.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub role: Option<Option<Role>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub active_id: Option<Option<i64>>,
}

/// Session after a transition plus the redirect it calls for, if any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionChange {
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Navigation>,
}

/// Holds the current session and writes it back on every change.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    current: RwLock<Session>,
}

impl SessionStore {
    /// Restore the persisted session; missing or unreadable data starts an empty one.
    pub async fn load(storage: Arc<dyn Storage>) -> Self {
        let session = match storage.read(SESSION_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Corrupt session record, starting fresh: {}", e);
                Session::default()
            }),
            Ok(None) => Session::default(),
            Err(e) => {
                tracing::warn!("Failed to read session, starting fresh: {}", e);
                Session::default()
            }
        };

        Self {
            storage,
            current: RwLock::new(session),
        }
    }

    pub async fn current(&self) -> Session {
        *self.current.read().await
    }

    /// Apply the fields present in `update` in one write.
    ///
    /// A redirect is reported only when the role actually changed: to the new role's
    /// dashboard, or to `/` when the role was cleared.
    pub async fn apply(&self, update: SessionUpdate) -> Result<SessionChange, AppError> {
        let mut current = self.current.write().await;
        let mut next = *current;
        if let Some(role) = update.role {
            next.role = role;
        }
        if let Some(active_id) = update.active_id {
            next.active_id = active_id;
        }

        if next != *current {
            self.persist(&next).await?;
        }

        let redirect = (next.role != current.role).then(|| Navigation::for_role(next.role));
        *current = next;

        Ok(SessionChange {
            session: next,
            redirect,
        })
    }

    /// Forget role and profile (logout).
    pub async fn clear(&self) -> Result<SessionChange, AppError> {
        let mut current = self.current.write().await;
        self.storage.remove(SESSION_KEY).await?;
        *current = Session::default();

        tracing::info!("Session cleared");
        Ok(SessionChange {
            session: *current,
            redirect: Some(Navigation::Root),
        })
    }

    async fn persist(&self, session: &Session) -> Result<(), AppError> {
        if session.is_empty() {
            return self.storage.remove(SESSION_KEY).await;
        }
        let raw = serde_json::to_string(session)
            .map_err(|e| AppError::WriteFailure(format!("Failed to serialize session: {}", e)))?;
        self.storage.write(SESSION_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;
    use async_trait::async_trait;

    struct ReadOnlyStorage;

    #[async_trait]
    impl Storage for ReadOnlyStorage {
        async fn read(&self, _key: &str) -> Result<Option<String>, AppError> {
            Ok(None)
        }

        async fn write(&self, key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::WriteFailure(format!("{} is read-only", key)))
        }

        async fn remove(&self, key: &str) -> Result<(), AppError> {
            Err(AppError::WriteFailure(format!("{} is read-only", key)))
        }
    }

    fn role(role: Role) -> SessionUpdate {
        SessionUpdate {
            role: Some(Some(role)),
            active_id: None,
        }
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let store = SessionStore::load(Arc::new(MemoryStorage::new())).await;
        assert_eq!(store.current().await, Session::default());
    }

    #[tokio::test]
    async fn test_role_change_redirects_to_dashboard() {
        let store = SessionStore::load(Arc::new(MemoryStorage::new())).await;

        let change = store.apply(role(Role::Farmer)).await.unwrap();
        assert_eq!(change.redirect, Some(Navigation::Dashboard(Role::Farmer)));
        assert_eq!(change.redirect.unwrap().path(), "/farmer/dashboard");

        // Same role again: nothing to do
        let again = store.apply(role(Role::Farmer)).await.unwrap();
        assert_eq!(again.redirect, None);

        let switched = store.apply(role(Role::Distributor)).await.unwrap();
        assert_eq!(
            switched.redirect,
            Some(Navigation::Dashboard(Role::Distributor))
        );
    }

    #[tokio::test]
    async fn test_round_trips_through_storage() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        {
            let store = SessionStore::load(storage.clone()).await;
            store
                .apply(SessionUpdate {
                    role: Some(Some(Role::Distributor)),
                    active_id: Some(Some(4)),
                })
                .await
                .unwrap();
        }

        let raw = storage.read(SESSION_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["role"], "distributor");
        assert_eq!(value["activeId"], 4);

        let reloaded = SessionStore::load(storage).await;
        assert_eq!(
            reloaded.current().await,
            Session {
                role: Some(Role::Distributor),
                active_id: Some(4),
            }
        );
    }

    #[tokio::test]
    async fn test_active_id_change_does_not_redirect() {
        let store = SessionStore::load(Arc::new(MemoryStorage::new())).await;
        store.apply(role(Role::Farmer)).await.unwrap();

        let change = store
            .apply(SessionUpdate {
                active_id: Some(Some(2)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(change.redirect, None);
        assert_eq!(change.session.active_id, Some(2));
    }

    #[tokio::test]
    async fn test_clear_removes_record() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone()).await;
        store.apply(role(Role::Farmer)).await.unwrap();

        let change = store.clear().await.unwrap();
        assert_eq!(change.redirect, Some(Navigation::Root));
        assert!(change.session.is_empty());
        assert_eq!(storage.read(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_record_starts_fresh() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.write(SESSION_KEY, "not json").await.unwrap();

        let store = SessionStore::load(storage).await;
        assert_eq!(store.current().await, Session::default());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_state() {
        let store = SessionStore::load(Arc::new(ReadOnlyStorage)).await;

        let err = store.apply(role(Role::Farmer)).await.unwrap_err();
        assert!(matches!(err, AppError::WriteFailure(_)));
        assert_eq!(store.current().await, Session::default());
    }

    #[test]
    fn test_navigation_serializes_as_path() {
        let change = SessionChange {
            session: Session::default(),
            redirect: Some(Navigation::Dashboard(Role::Distributor)),
        };
        let value = serde_json::to_value(change).unwrap();
        assert_eq!(value["redirect"], "/distributor/dashboard");
        assert_eq!(value["session"]["role"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_null_fields_clear_session() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let store = SessionStore::load(storage.clone()).await;
        store
            .apply(SessionUpdate {
                role: Some(Some(Role::Farmer)),
                active_id: Some(Some(3)),
            })
            .await
            .unwrap();

        let update: SessionUpdate = serde_json::from_str(r#"{"activeId":null}"#).unwrap();
        let change = store.apply(update).await.unwrap();
        assert_eq!(change.session.role, Some(Role::Farmer));
        assert_eq!(change.session.active_id, None);
        assert_eq!(change.redirect, None);

        let update: SessionUpdate = serde_json::from_str(r#"{"role":null}"#).unwrap();
        let change = store.apply(update).await.unwrap();
        assert_eq!(change.session, Session::default());
        assert_eq!(change.redirect, Some(Navigation::Root));
        assert_eq!(storage.read(SESSION_KEY).await.unwrap(), None);
    }

    #[test]
    fn test_update_absent_fields_are_kept() {
        let update: SessionUpdate = serde_json::from_str("{}").unwrap();
        assert_eq!(update.role, None);
        assert_eq!(update.active_id, None);
    }
}
