use std::sync::Arc;
use std::time::Duration;
use streamhub_ingest::ingest::WatchEvent;
use streamhub_ingest::loadgen::{self, LoadgenConfig};
use streamhub_ingest::storage::AppendLog;
use streamhub_ingest::web::{build_router, start_server};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;

async fn spawn_server(
    log_path: &std::path::Path,
) -> (
    std::net::SocketAddr,
    watch::Sender<bool>,
    tokio::task::JoinHandle<Result<(), std::io::Error>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(Arc::new(AppendLog::new(log_path)), 2 * 1024 * 1024);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(start_server(listener, app, shutdown_rx));
    (addr, shutdown_tx, handle)
}

#[tokio::test]
async fn test_loadgen_against_live_server() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("data/events.log");
    let (addr, shutdown_tx, handle) = spawn_server(&log_path).await;

    let config = LoadgenConfig {
        url: format!("http://{}/events", addr),
        rate: 10_000,
        batch: 25,
        users: 10,
        videos: 10,
        count: Some(4),
    };
    let summary = loadgen::run(&config).await.unwrap();

    assert_eq!(summary.batches_sent, 4);
    assert_eq!(summary.events_sent, 100);
    assert_eq!(summary.failures, 0);

    let content = std::fs::read_to_string(&log_path).unwrap();
    let events: Vec<WatchEvent> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 100);
    assert!(events.iter().all(|e| e.user_id.starts_with("user-") && !e.ts.is_empty()));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should shut down")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_http_client_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("events.log");
    let (addr, shutdown_tx, _handle) = spawn_server(&log_path).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let health = client
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(health.text().await.unwrap(), "ok");

    let resp = client
        .post(format!("http://{}/events", addr))
        .body(r#"{"user_id":"u1","video_id":"v1","watch_seconds":12.5}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), r#"{"status":"accepted"}"#);

    let resp = client
        .get(format!("http://{}/events", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);

    let content = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.lines().count(), 1);

    shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn test_loadgen_counts_failures_when_endpoint_down() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let config = LoadgenConfig {
        url: format!("http://{}/events", addr),
        rate: 10_000,
        batch: 5,
        count: Some(2),
        ..LoadgenConfig::default()
    };
    let summary = loadgen::run(&config).await.unwrap();

    assert_eq!(summary.batches_sent, 2);
    assert_eq!(summary.events_sent, 0);
    assert_eq!(summary.failures, 2);
}
