use async_trait::async_trait;
use std::path::PathBuf;

/// Destination for encoded event records.
///
/// Implementations must make each `append` call contiguous: no other
/// caller's bytes may land inside a single record block.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append `record` followed by a newline. Returns only once the bytes
    /// have been handed to the underlying file descriptor.
    async fn append(&self, record: Vec<u8>) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write task failed: {0}")]
    Task(String),
}
