//! Synthetic load for a running ingest endpoint.
//!
//! Posts batches of random watch events at roughly `rate` events per second.

use crate::ingest::WatchEvent;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LoadgenError {
    #[error("invalid loadgen settings: {0}")]
    InvalidConfig(String),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct LoadgenConfig {
    pub url: String,
    /// Target events per second
    pub rate: u32,
    /// Events per POST
    pub batch: usize,
    pub users: u32,
    pub videos: u32,
    /// Stop after this many batches; run until interrupted when `None`
    pub count: Option<u64>,
}

impl Default for LoadgenConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/events".to_string(),
            rate: 100,
            batch: 100,
            users: 1000,
            videos: 5000,
            count: None,
        }
    }
}

impl LoadgenConfig {
    pub fn validate(&self) -> Result<(), LoadgenError> {
        if self.rate == 0 {
            return Err(LoadgenError::InvalidConfig("rate must be at least 1".to_string()));
        }
        if self.batch == 0 {
            return Err(LoadgenError::InvalidConfig("batch must be at least 1".to_string()));
        }
        if self.users == 0 || self.videos == 0 {
            return Err(LoadgenError::InvalidConfig(
                "user and video pools must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Time between batch starts so that `batch` events per POST add up to
    /// `rate` events per second.
    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs_f64(self.batch as f64 / self.rate.max(1) as f64)
            .max(Duration::from_nanos(1))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadgenSummary {
    pub batches_sent: u64,
    pub events_sent: u64,
    pub failures: u64,
}

pub fn generate_event<R: Rng>(rng: &mut R, users: u32, videos: u32, now: DateTime<Utc>) -> WatchEvent {
    WatchEvent {
        user_id: format!("user-{}", rng.gen_range(1..=users)),
        video_id: format!("vid-{}", rng.gen_range(1..=videos)),
        watch_seconds: (rng.gen::<f64>() * 60_000.0).round() / 1000.0,
        ts: now.to_rfc3339_opts(SecondsFormat::Nanos, true),
    }
}

pub fn generate_batch<R: Rng>(rng: &mut R, config: &LoadgenConfig) -> Vec<WatchEvent> {
    (0..config.batch)
        .map(|_| generate_event(rng, config.users, config.videos, Utc::now()))
        .collect()
}

/// Post batches until `config.count` is reached.
///
/// Failed posts are logged and counted; the run keeps going.
pub async fn run(config: &LoadgenConfig) -> Result<LoadgenSummary, LoadgenError> {
    config.validate()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .no_proxy()
        .build()?;
    // Ticks are measured from batch start, so time spent posting counts
    // against the interval. A slow endpoint delays later ticks instead of
    // producing a burst.
    let mut ticker = tokio::time::interval(config.batch_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut summary = LoadgenSummary::default();

    info!(
        url = %config.url,
        rate = config.rate,
        batch = config.batch,
        "Posting synthetic watch events"
    );

    while config.count.map_or(true, |count| summary.batches_sent < count) {
        ticker.tick().await;
        let batch = generate_batch(&mut rand::thread_rng(), config);

        match client.post(&config.url).json(&batch).send().await {
            Ok(resp) if resp.status().is_success() => {
                summary.events_sent += batch.len() as u64;
            }
            Ok(resp) => {
                summary.failures += 1;
                warn!(status = %resp.status(), "Ingest endpoint rejected batch");
            }
            Err(e) => {
                summary.failures += 1;
                warn!(error = %e, "Failed to post batch");
            }
        }
        summary.batches_sent += 1;
    }

    info!(
        batches = summary.batches_sent,
        events = summary.events_sent,
        failures = summary.failures,
        "Load generation finished"
    );
    Ok(summary)
}
