//! Record store that forwards to another CropLink instance over HTTP.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{DeleteResult, RecordStore};
use crate::errors::{codes, AppError, ErrorResponse};
use crate::models::DirectoryRecord;

/// Success envelope returned by the upstream API.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Client for `/api/{farmers,distributors}` on an upstream instance.
pub struct RemoteStore<R> {
    client: Client,
    collection_url: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: DirectoryRecord> RemoteStore<R> {
    pub fn new(client: Client, base_url: &str) -> Self {
        let collection_url = format!(
            "{}/api/{}",
            base_url.trim_end_matches('/'),
            R::ROLE.collection()
        );

        Self {
            client,
            collection_url,
            _record: PhantomData,
        }
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{}", self.collection_url, id)
    }
}

/// Unwrap the upstream envelope, mapping error responses back onto the local taxonomy.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        let envelope: Envelope<T> = response.json().await?;
        return Ok(envelope.data);
    }

    let (code, message) = match response.json::<ErrorResponse>().await {
        Ok(body) => (body.error.code, body.error.message),
        Err(_) => (String::new(), format!("Upstream responded with {}", status)),
    };

    Err(match (status, code.as_str()) {
        (StatusCode::NOT_FOUND, _) => AppError::NotFound(message),
        (_, codes::VALIDATION_ERROR) => AppError::Validation(message),
        (StatusCode::BAD_REQUEST, _) => AppError::BadRequest(message),
        _ => AppError::WriteFailure(message),
    })
}

#[async_trait]
impl<R: DirectoryRecord> RecordStore<R> for RemoteStore<R> {
    async fn list(&self) -> Result<Vec<R>, AppError> {
        let result = match self.client.get(&self.collection_url).send().await {
            Ok(response) => read_envelope::<Vec<R>>(response).await,
            Err(e) => Err(AppError::ReadFailure(e.to_string())),
        };

        Ok(result.unwrap_or_else(|e| {
            tracing::warn!(
                "Failed to list {} from upstream, treating as empty: {}",
                R::ROLE.collection(),
                e
            );
            Vec::new()
        }))
    }

    async fn get(&self, id: i64) -> Result<Option<R>, AppError> {
        let result = match self.client.get(self.item_url(id)).send().await {
            Ok(response) => read_envelope::<R>(response).await,
            Err(e) => Err(AppError::ReadFailure(e.to_string())),
        };

        match result {
            Ok(record) => Ok(Some(record)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch {} {} from upstream, treating as absent: {}",
                    R::ROLE.label(),
                    id,
                    e
                );
                Ok(None)
            }
        }
    }

    async fn create(&self, request: R::Create) -> Result<R, AppError> {
        let response = self
            .client
            .post(&self.collection_url)
            .json(&request)
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn update(&self, id: i64, update: R::Update) -> Result<R, AppError> {
        let response = self
            .client
            .put(self.item_url(id))
            .json(&update)
            .send()
            .await?;

        read_envelope(response).await.map_err(|e| match e {
            AppError::NotFound(_) => {
                AppError::NotFound(format!("{} {} not found", R::ROLE.label(), id))
            }
            other => other,
        })
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let response = self.client.delete(self.item_url(id)).send().await?;
        let result: DeleteResult = read_envelope(response).await?;
        Ok(result.deleted)
    }
}
