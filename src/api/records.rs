//! Directory collection endpoints, shared by farmers and distributors.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use super::{parse_id, parse_index, success, ApiJson, ApiResult};
use crate::crops;
use crate::db::{DeleteResult, RecordSource, Repository};
use crate::errors::AppError;
use crate::models::{DirectoryRecord, Validate};
use crate::search::{self, unique_crops, Coordinates, SearchHit, SearchQuery, SortKey};
use crate::AppState;

/// Query parameters accepted by the search endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub location: String,
    pub crop: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl SearchParams {
    /// Build the query, using `fallback` as origin when the request carries no coordinates.
    pub fn into_query(self, fallback: Option<Coordinates>) -> SearchQuery {
        SearchQuery {
            location: self.location,
            crop: self.crop,
            sort: self.sort,
            origin: Coordinates::from_parts(self.lat, self.lon).or(fallback),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponse<R> {
    pub results: Vec<SearchHit<R>>,
    pub total: usize,
}

impl<R> SearchResponse<R> {
    pub fn new(results: Vec<SearchHit<R>>) -> Self {
        let total = results.len();
        Self { results, total }
    }
}

/// Body of the crop editing endpoints.
#[derive(Debug, Deserialize)]
pub struct CropRequest {
    pub crop: String,
}

fn not_found<R: DirectoryRecord>(id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", R::ROLE.label(), id))
}

async fn fetch<R>(repo: &Repository, id: i64) -> Result<R, AppError>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    repo.records::<R>()
        .get(id)
        .await?
        .ok_or_else(|| not_found::<R>(id))
}

/// GET /api/{collection} - List all records.
pub async fn list_records<R>(State(state): State<AppState>) -> ApiResult<Vec<R>>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    success(state.repo.records::<R>().list().await?)
}

/// GET /api/{collection}/{id} - Get a single record.
pub async fn get_record<R>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<R>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let id = parse_id(&id)?;
    success(fetch::<R>(&state.repo, id).await?)
}

/// POST /api/{collection} - Create a new record.
pub async fn create_record<R>(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<R::Create>,
) -> ApiResult<R>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    request.validate()?;

    let record = state.repo.records::<R>().create(request).await?;
    tracing::info!("Created {} {}", R::ROLE.label(), record.id());
    success(record)
}

/// PUT /api/{collection}/{id} - Update a record.
pub async fn update_record<R>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<R::Update>,
) -> ApiResult<R>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let id = parse_id(&id)?;
    request.validate()?;

    success(state.repo.records::<R>().update(id, request).await?)
}

/// DELETE /api/{collection}/{id} - Delete a record.
pub async fn delete_record<R>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResult>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let id = parse_id(&id)?;
    let deleted = state.repo.records::<R>().delete(id).await?;
    if deleted {
        tracing::info!("Deleted {} {}", R::ROLE.label(), id);
    }
    success(DeleteResult { deleted })
}

/// GET /api/{collection}/crops - Distinct crops across the collection.
pub async fn list_crops<R>(State(state): State<AppState>) -> ApiResult<Vec<String>>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let records = state.repo.records::<R>().list().await?;
    success(unique_crops(&records))
}

/// GET /api/{collection}/search - Filter and sort one collection.
pub async fn search_records<R>(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchResponse<R>>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let query = params.into_query(None);
    let records = state.repo.records::<R>().list().await?;
    success(SearchResponse::new(search::search(&records, &query)))
}

/// Apply a crop list edit to a stored record as one read-modify-write.
async fn edit_crops<R>(
    repo: &Repository,
    id: i64,
    edit: impl FnOnce(&[String]) -> Result<Vec<String>, AppError> + Send + 'static,
) -> Result<R, AppError>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    repo.records::<R>()
        .update_with(
            id,
            Box::new(move |record: &R| edit(record.crops()).map(R::crops_update)),
        )
        .await
}

/// POST /api/{collection}/{id}/crops - Append a crop.
pub async fn add_crop<R>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<CropRequest>,
) -> ApiResult<R>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let id = parse_id(&id)?;
    let crop = request.crop;
    let record = edit_crops::<R>(&state.repo, id, move |current| {
        crops::add_crop(current, &crop)
    })
    .await?;
    success(record)
}

/// PUT /api/{collection}/{id}/crops/{index} - Rename a crop in place.
pub async fn rename_crop<R>(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
    ApiJson(request): ApiJson<CropRequest>,
) -> ApiResult<R>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let id = parse_id(&id)?;
    let index = parse_index(&index)?;
    let crop = request.crop;
    let record = edit_crops::<R>(&state.repo, id, move |current| {
        crops::rename_crop(current, index, &crop)
    })
    .await?;
    success(record)
}

/// DELETE /api/{collection}/{id}/crops/{index} - Remove a crop.
pub async fn remove_crop<R>(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> ApiResult<R>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let id = parse_id(&id)?;
    let index = parse_index(&index)?;
    let record = edit_crops::<R>(&state.repo, id, move |current| {
        crops::remove_crop(current, index)
    })
    .await?;
    success(record)
}
