//! Record store over a single JSON array document.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RecordEdit, RecordStore, Storage};
use crate::errors::AppError;
use crate::models::DirectoryRecord;

/// A collection persisted as one JSON array under the role's storage key.
///
/// Every mutation loads the whole array, changes it, and writes the whole array back.
pub struct JsonCollection<R> {
    storage: Arc<dyn Storage>,
    key: &'static str,
    /// Serialises mutations and remembers the highest id this process has assigned, so ids
    /// are not handed out twice even after the newest record is deleted.
    last_assigned: Mutex<i64>,
    _record: PhantomData<fn() -> R>,
}

impl<R: DirectoryRecord> JsonCollection<R> {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            key: R::ROLE.storage_key(),
            last_assigned: Mutex::new(0),
            _record: PhantomData,
        }
    }

    /// Load the collection, treating missing, unreadable or corrupt data as empty.
    async fn load(&self) -> Vec<R> {
        match self.storage.read(self.key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<R>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Corrupt {} document, treating as empty: {}", self.key, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}, treating as empty: {}", self.key, e);
                Vec::new()
            }
        }
    }

    async fn save(&self, records: &[R]) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(records).map_err(|e| {
            AppError::WriteFailure(format!("Failed to serialize {}: {}", self.key, e))
        })?;
        self.storage.write(self.key, &raw).await
    }

    fn not_found(id: i64) -> AppError {
        AppError::NotFound(format!("{} {} not found", R::ROLE.label(), id))
    }
}

#[async_trait]
impl<R: DirectoryRecord> RecordStore<R> for JsonCollection<R> {
    async fn list(&self) -> Result<Vec<R>, AppError> {
        Ok(self.load().await)
    }

    async fn get(&self, id: i64) -> Result<Option<R>, AppError> {
        Ok(self.load().await.into_iter().find(|r| r.id() == id))
    }

    async fn create(&self, request: R::Create) -> Result<R, AppError> {
        let mut last_assigned = self.last_assigned.lock().await;
        let mut records = self.load().await;

        let max_id = records.iter().map(|r| r.id()).max().unwrap_or(0);
        let id = max_id
            .max(*last_assigned)
            .checked_add(1)
            .ok_or_else(|| AppError::WriteFailure(format!("No ids left in {}", self.key)))?;

        let record = R::from_request(id, request);
        records.push(record.clone());
        self.save(&records).await?;
        *last_assigned = id;

        tracing::debug!("Created {} {}", R::ROLE.label(), id);
        Ok(record)
    }

    async fn update(&self, id: i64, update: R::Update) -> Result<R, AppError> {
        self.update_with(id, Box::new(move |_: &R| Ok(update))).await
    }

    async fn update_with(&self, id: i64, edit: RecordEdit<R>) -> Result<R, AppError> {
        let _guard = self.last_assigned.lock().await;
        let mut records = self.load().await;

        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        let update = edit(&*record)?;
        record.apply_update(update);
        let updated = record.clone();

        self.save(&records).await?;

        tracing::debug!("Updated {} {}", R::ROLE.label(), id);
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let _guard = self.last_assigned.lock().await;
        let mut records = self.load().await;

        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(false);
        }

        self.save(&records).await?;

        tracing::debug!("Deleted {} {}", R::ROLE.label(), id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;
    use crate::models::{
        CreateDistributorRequest, CreateFarmerRequest, Distributor, Farmer, UpdateFarmerRequest,
    };

    fn farmer_request(name: &str, location: &str) -> CreateFarmerRequest {
        CreateFarmerRequest {
            name: name.to_string(),
            farm_name: format!("{} Farm", name),
            contact: "555-0100".to_string(),
            location: location.to_string(),
            latitude: None,
            longitude: None,
            crops: Vec::new(),
        }
    }

    fn farmers(storage: Arc<dyn Storage>) -> JsonCollection<Farmer> {
        JsonCollection::new(storage)
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage;

    #[async_trait]
    impl Storage for ReadOnlyStorage {
        async fn read(&self, _key: &str) -> Result<Option<String>, AppError> {
            Ok(None)
        }

        async fn write(&self, key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::WriteFailure(format!("{} is read-only", key)))
        }

        async fn remove(&self, _key: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    /// Storage whose reads always fail.
    struct UnreadableStorage;

    #[async_trait]
    impl Storage for UnreadableStorage {
        async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
            Err(AppError::ReadFailure(format!("{} is unreadable", key)))
        }

        async fn write(&self, _key: &str, _value: &str) -> Result<(), AppError> {
            Ok(())
        }

        async fn remove(&self, _key: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = farmers(Arc::new(MemoryStorage::new()));

        let mut request = farmer_request("Ada", "Austin, TX");
        request.crops = vec!["corn".to_string()];
        let created = store.create(request.clone()).await.unwrap();

        assert_eq!(created.id, 1);
        let fetched = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, Farmer::from_request(1, request));
    }

    #[tokio::test]
    async fn test_ids_are_max_plus_one() {
        let store = farmers(Arc::new(MemoryStorage::new()));
        for name in ["A", "B", "C"] {
            store.create(farmer_request(name, "x")).await.unwrap();
        }

        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_ids_continue_from_existing_data() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage
            .write(
                "farmers_data",
                r#"[{"id":10,"name":"Old","farmName":"F","contact":"c","location":"l","crops":[]}]"#,
            )
            .await
            .unwrap();

        let store = farmers(storage);
        let created = store.create(farmer_request("New", "x")).await.unwrap();
        assert_eq!(created.id, 11);
    }

    #[tokio::test]
    async fn test_exhausted_ids_fail_without_writing() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let seeded = format!(
            r#"[{{"id":{},"name":"Last","farmName":"F","contact":"c","location":"l","crops":[]}}]"#,
            i64::MAX
        );
        storage.write("farmers_data", &seeded).await.unwrap();

        let store = farmers(storage.clone());
        let err = store.create(farmer_request("New", "x")).await.unwrap_err();

        assert!(matches!(err, AppError::WriteFailure(_)));
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert_eq!(storage.read("farmers_data").await.unwrap().unwrap(), seeded);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_deleting_newest() {
        let store = farmers(Arc::new(MemoryStorage::new()));
        store.create(farmer_request("A", "x")).await.unwrap();
        let second = store.create(farmer_request("B", "x")).await.unwrap();

        assert!(store.delete(second.id).await.unwrap());
        let third = store.create(farmer_request("C", "x")).await.unwrap();

        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_id() {
        let store = farmers(Arc::new(MemoryStorage::new()));
        let created = store.create(farmer_request("Ada", "Austin")).await.unwrap();

        let updated = store
            .update(
                created.id,
                UpdateFarmerRequest {
                    location: Some("Dallas".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.location, "Dallas");
        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.farm_name, created.farm_name);
        assert_eq!(store.get(created.id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = farmers(Arc::new(MemoryStorage::new()));
        let err = store
            .update(42, UpdateFarmerRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err, AppError::NotFound("Farmer 42 not found".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_edits_are_not_lost() {
        let store = Arc::new(farmers(Arc::new(MemoryStorage::new())));
        let created = store.create(farmer_request("Ada", "Austin")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let crop = format!("crop-{}", i);
                store
                    .update_with(
                        created.id,
                        Box::new(move |farmer: &Farmer| {
                            let crops = crate::crops::add_crop(&farmer.crops, &crop)?;
                            Ok(Farmer::crops_update(crops))
                        }),
                    )
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let farmer = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(farmer.crops.len(), 10);
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_record_untouched() {
        let store = farmers(Arc::new(MemoryStorage::new()));
        let created = store.create(farmer_request("Ada", "Austin")).await.unwrap();

        let err = store
            .update_with(
                created.id,
                Box::new(|_: &Farmer| Err(AppError::Validation("nope".to_string()))),
            )
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Validation("nope".to_string()));
        assert_eq!(store.get(created.id).await.unwrap().unwrap(), created);

        let missing = store
            .update_with(99, Box::new(|_: &Farmer| Ok(UpdateFarmerRequest::default())))
            .await
            .unwrap_err();
        assert_eq!(missing, AppError::NotFound("Farmer 99 not found".to_string()));
    }

    #[tokio::test]
    async fn test_delete_then_get_absent() {
        let store = farmers(Arc::new(MemoryStorage::new()));
        let created = store.create(farmer_request("Ada", "Austin")).await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(store.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = farmers(Arc::new(MemoryStorage::new()));
        store.create(farmer_request("Ada", "Austin")).await.unwrap();
        let before = store.list().await.unwrap();

        assert!(!store.delete(99).await.unwrap());
        assert_eq!(store.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_corrupt_document_reads_as_empty() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.write("farmers_data", "{not json").await.unwrap();

        let store = farmers(storage);
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.get(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_storage_reads_as_empty() {
        let store = farmers(Arc::new(UnreadableStorage));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let store = farmers(Arc::new(ReadOnlyStorage));
        let err = store
            .create(farmer_request("Ada", "Austin"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WriteFailure(_)));
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let farmer_store = farmers(storage.clone());
        let distributor_store: JsonCollection<Distributor> = JsonCollection::new(storage);

        farmer_store
            .create(farmer_request("Ada", "Austin"))
            .await
            .unwrap();
        let distributor = distributor_store
            .create(CreateDistributorRequest {
                name: "Cy".to_string(),
                company_name: "Fresh Haul".to_string(),
                contact: "cy@example.com".to_string(),
                location: "Denver".to_string(),
                latitude: None,
                longitude: None,
                crops: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(distributor.id, 1);
        assert_eq!(farmer_store.list().await.unwrap().len(), 1);
        assert_eq!(distributor_store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = Arc::new(farmers(Arc::new(MemoryStorage::new())));

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(farmer_request(&format!("F{}", i), "x"))
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        assert_eq!(ids, (1..=10).collect::<Vec<i64>>());
    }
}
