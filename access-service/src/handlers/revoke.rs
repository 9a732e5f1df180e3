use crate::models::{RemoveAccessRequest, RemoveAccessResponse};
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// Revoke a batch of access grants.
///
/// Per-item failures are reported in the response body; only a malformed or
/// oversized batch fails the request as a whole.
#[tracing::instrument(skip(state, request), fields(items = request.repos.len()))]
pub async fn remove_access(
    State(state): State<AppState>,
    Json(request): Json<RemoveAccessRequest>,
) -> Result<Json<RemoveAccessResponse>, AppError> {
    request.validate_batch(state.config.revocation.max_batch)?;

    let results = state.revoker.apply(&request.repos).await;

    Ok(Json(RemoveAccessResponse { results }))
}
