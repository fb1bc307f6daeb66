use super::traits::{EventSink, SinkError};
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Append-only, newline-delimited log file shared by all requests.
///
/// Every append takes a single process-wide lock, then opens, writes,
/// flushes and closes the file. No handle is held between calls. The write
/// runs on the blocking pool, so it completes even if the request future
/// that issued it is dropped.
#[derive(Clone)]
pub struct AppendLog {
    path: Arc<Mutex<PathBuf>>,
}

impl AppendLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Arc::new(Mutex::new(path.as_ref().to_path_buf())),
        }
    }

    /// Location of the log file, as used by every append.
    pub fn path(&self) -> PathBuf {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventSink for AppendLog {
    async fn append(&self, record: Vec<u8>) -> Result<(), SinkError> {
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            // The guard carries no state a panicking writer could corrupt.
            let path = path.lock().unwrap_or_else(PoisonError::into_inner);
            write_record(&path, &record)
        })
        .await
        .map_err(|e| SinkError::Task(e.to_string()))?
    }
}

fn write_record(path: &Path, record: &[u8]) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(record)
        .and_then(|_| writer.write_all(b"\n"))
        .and_then(|_| writer.flush())
        .map_err(|source| SinkError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::trace!(path = %path.display(), bytes = record.len() + 1, "Appended record");
    Ok(())
}
