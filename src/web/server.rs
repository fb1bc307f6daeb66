use super::api::{health_check, ingest_events, AppState};
use crate::storage::EventSink;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Build the ingest router around an injected sink.
pub fn build_router(sink: Arc<dyn EventSink>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(health_check).post(health_check))
        .route("/events", post(ingest_events))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(AppState { sink })
}

/// Serve `app` on an already-bound listener until `shutdown_rx` flips to true.
pub async fn start_server(
    listener: TcpListener,
    app: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    info!(addr = %listener.local_addr()?, "Ingest server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|&v| v).await;
            info!("Ingest server shutting down gracefully");
        })
        .await
}
