use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single watch-telemetry record as submitted by a client.
///
/// Only unknown fields are rejected. Missing or `null` known fields fall
/// back to their zero values, and `ts` is filled in by [`normalize`] before
/// persisting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WatchEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub video_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub watch_seconds: f64,
    /// RFC3339 timestamp with nanosecond precision
    #[serde(deserialize_with = "null_as_default")]
    pub ts: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fill an empty `ts` with the current UTC instant.
pub fn normalize(event: WatchEvent) -> WatchEvent {
    normalize_at(event, Utc::now())
}

/// Fill an empty `ts` with `now`. A non-empty `ts` is left untouched.
pub fn normalize_at(mut event: WatchEvent, now: DateTime<Utc>) -> WatchEvent {
    if event.ts.is_empty() {
        event.ts = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
    }
    event
}

/// Encode events as newline-joined JSON records, without a trailing newline.
///
/// The sink appends the terminating newline, so a batch of N events becomes
/// exactly N lines.
pub fn encode_batch(events: &[WatchEvent]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            buf.push(b'\n');
        }
        serde_json::to_writer(&mut buf, event)?;
    }
    Ok(buf)
}
