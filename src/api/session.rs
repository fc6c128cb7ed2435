//! Session API endpoints.

use axum::extract::State;

use super::{success, ApiJson, ApiResult};
use crate::session::{Session, SessionChange, SessionUpdate};
use crate::AppState;

/// GET /api/session - Current role and active profile.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<Session> {
    success(state.repo.session().current().await)
}

/// PUT /api/session - Change role and/or active profile.
pub async fn update_session(
    State(state): State<AppState>,
    ApiJson(update): ApiJson<SessionUpdate>,
) -> ApiResult<SessionChange> {
    let change = state.repo.session().apply(update).await?;
    if let Some(redirect) = change.redirect {
        tracing::info!("Session role changed, redirecting to {}", redirect.path());
    }
    success(change)
}

/// DELETE /api/session - Log out.
pub async fn clear_session(State(state): State<AppState>) -> ApiResult<SessionChange> {
    success(state.repo.session().clear().await?)
}
