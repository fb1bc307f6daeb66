use crate::config::parse::{load_or_default, validate_config, ConfigError};
use crate::config::{expand_tilde, Config};
use crate::storage::AppendLog;
use crate::web::{build_router, start_server};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create data dir {}: {source}", .path.display())]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("web server error: {0}")]
    WebServer(std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub listen: Option<String>,
    pub data_dir: Option<PathBuf>,
}

pub async fn run(
    config_path: Option<PathBuf>,
    overrides: RunOverrides,
) -> Result<(), Box<dyn std::error::Error>> {
    run_ingest(config_path.as_deref(), overrides)
        .await
        .map_err(|e| e.into())
}

async fn run_ingest(config_path: Option<&Path>, overrides: RunOverrides) -> Result<(), RunError> {
    if let Some(path) = config_path {
        info!(config_path = %path.display(), "Loading configuration");
    }
    let config = resolve_config(config_path, overrides)?;

    // Nothing can be ingested without the data dir, so failure here is fatal.
    ensure_data_dir(&config.storage.data_dir)?;

    let sink = Arc::new(AppendLog::new(config.storage.log_path()));
    info!(path = %sink.path().display(), "Appending events to log file");
    let app = build_router(sink, config.server.max_body_bytes);

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .map_err(|source| RunError::Bind {
            addr: config.server.listen.clone(),
            source,
        })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server_handle = tokio::spawn(start_server(listener, app, shutdown_rx));

    info!(
        "POST events to http://{}/events (single object or array), press Ctrl+C to shutdown",
        config.server.listen
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
        result = &mut server_handle => {
            return result?.map_err(RunError::WebServer);
        }
    }

    server_handle.await?.map_err(RunError::WebServer)?;
    info!("Ingest shutdown complete");
    Ok(())
}

/// Load config (or defaults) and apply command-line overrides.
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: RunOverrides,
) -> Result<Config, RunError> {
    let mut config = load_or_default(config_path)?;

    if let Some(listen) = overrides.listen {
        config.server.listen = listen;
    }
    if let Some(data_dir) = overrides.data_dir {
        config.storage.data_dir = expand_tilde(&data_dir);
    }

    validate_config(&config)?;
    Ok(config)
}

/// Create the data directory if it does not exist yet.
pub fn ensure_data_dir(path: &Path) -> Result<(), RunError> {
    if path.exists() {
        return Ok(());
    }

    info!(path = %path.display(), "Creating data directory");
    std::fs::create_dir_all(path).map_err(|source| RunError::DataDir {
        path: path.to_path_buf(),
        source,
    })
}
