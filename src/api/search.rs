//! Search API endpoint driven by the session role.

use axum::extract::{Query, State};
use serde::Serialize;

use super::{success, ApiResult, SearchParams, SearchResponse};
use crate::db::{RecordSource, Repository};
use crate::errors::AppError;
use crate::models::{DirectoryRecord, Distributor, Farmer, Role};
use crate::search::{self, Coordinates};
use crate::AppState;

/// Results of searching the other side of the marketplace.
#[derive(Debug, Serialize)]
pub struct DirectorySearch {
    /// Collection that was searched.
    pub searching: Role,
    #[serde(flatten)]
    pub results: DirectoryResults,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DirectoryResults {
    Farmers(SearchResponse<Farmer>),
    Distributors(SearchResponse<Distributor>),
}

/// Coordinates of the signed-in profile, if it exists and has them.
async fn active_origin<R>(repo: &Repository, active_id: Option<i64>) -> Option<Coordinates>
where
    R: DirectoryRecord,
    Repository: RecordSource<R>,
{
    let id = active_id?;
    match repo.records::<R>().get(id).await {
        Ok(record) => record.and_then(|r| r.coordinates()),
        Err(e) => {
            tracing::warn!("Could not load active {} {}: {}", R::ROLE.label(), id, e);
            None
        }
    }
}

/// GET /api/search - Farmers search distributors and distributors search farmers.
pub async fn search_directory(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<DirectorySearch> {
    let session = state.repo.session().current().await;
    let role = session.role.ok_or_else(|| {
        AppError::BadRequest("Choose farmer or distributor before searching".to_string())
    })?;

    let results = match role {
        Role::Farmer => {
            let origin = active_origin::<Farmer>(&state.repo, session.active_id).await;
            let query = params.into_query(origin);
            let records = state.repo.distributors().list().await?;
            DirectoryResults::Distributors(SearchResponse::new(search::search(&records, &query)))
        }
        Role::Distributor => {
            let origin = active_origin::<Distributor>(&state.repo, session.active_id).await;
            let query = params.into_query(origin);
            let records = state.repo.farmers().list().await?;
            DirectoryResults::Farmers(SearchResponse::new(search::search(&records, &query)))
        }
    };

    tracing::debug!("Session search by {} over {}", role.label(), role.opposite().collection());
    success(DirectorySearch {
        searching: role.opposite(),
        results,
    })
}
