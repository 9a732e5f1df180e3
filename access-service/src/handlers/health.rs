use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "message": "Service is healthy",
            "service": "access-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness probe. Without an operator credential every scan would fail,
/// so the service reports itself as not ready.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    if !state.has_credential {
        return Err(AppError::ServiceUnavailable(
            "GitHub credential is not configured".to_string(),
        ));
    }

    Ok((StatusCode::OK, Json(json!({ "status": "ready" }))))
}
