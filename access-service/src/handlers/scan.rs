use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderName},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use serde::Deserialize;
use service_core::error::AppError;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub username: String,
}

/// Stream a live access scan for `username` as server-sent events.
///
/// Each event is a single `data:` line holding the JSON-encoded scan event.
/// The scan stops at the next repository boundary once the client goes away.
#[tracing::instrument(skip(state))]
pub async fn stream_user_access(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<impl IntoResponse, AppError> {
    let username = query.username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "username query parameter is required"
        )));
    }

    let events = state.scanner.stream(username.to_string());
    let stream = ReceiverStream::new(events).map(|event| Event::default().json_data(&event));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    ))
}
