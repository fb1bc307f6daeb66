use crate::ingest::{decode_payload, encode_batch, normalize, DecodeError, WatchEvent};
use crate::storage::{EventSink, SinkError};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Shared state for the ingest API
#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<dyn EventSink>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

impl AcceptedResponse {
    fn accepted() -> Json<Self> {
        Json(Self { status: "accepted" })
    }
}

/// GET|POST /healthz
pub async fn health_check() -> &'static str {
    "ok"
}

/// POST /events
///
/// Accepts a single event object or an array of events. Missing timestamps
/// are filled per event, then the whole request is appended as one
/// contiguous block.
pub async fn ingest_events(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AcceptedResponse>, ApiError> {
    let events: Vec<WatchEvent> = decode_payload(&body)
        .inspect_err(|e| warn!(error = %e, bytes = body.len(), "Rejected ingest payload"))?
        .into_events()
        .into_iter()
        .map(normalize)
        .collect();

    if events.is_empty() {
        debug!("Empty batch, nothing to append");
        return Ok(AcceptedResponse::accepted());
    }

    let record = encode_batch(&events).map_err(|e| ApiError::InternalError(e.to_string()))?;

    state
        .sink
        .append(record)
        .await
        .inspect_err(|e| error!(error = %e, events = events.len(), "Failed to append events"))?;

    debug!(events = events.len(), "Appended events");
    Ok(AcceptedResponse::accepted())
}

// Error handling
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalError(String),
}

impl From<DecodeError> for ApiError {
    fn from(e: DecodeError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<SinkError> for ApiError {
    fn from(e: SinkError) -> Self {
        ApiError::InternalError(format!("write err: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}
