use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamhub_ingest::cli::run::RunOverrides;
use streamhub_ingest::loadgen::LoadgenConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "streamhub-ingest")]
#[command(about = "Watch-event ingest endpoint", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the ingest endpoint (default)
    Run {
        /// Override server.listen
        #[arg(long)]
        listen: Option<String>,
        /// Override storage.data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Post random watch events to a running endpoint
    Loadgen {
        #[arg(long, default_value = "http://localhost:8080/events")]
        url: String,
        /// Events per second
        #[arg(long, default_value_t = 100)]
        rate: u32,
        #[arg(long, default_value_t = 100)]
        batch: usize,
        #[arg(long, default_value_t = 1000)]
        users: u32,
        #[arg(long, default_value_t = 5000)]
        videos: u32,
        /// Stop after this many batches
        #[arg(long)]
        count: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streamhub_ingest=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config_path = streamhub_ingest::config::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run { listen, data_dir }) => {
            streamhub_ingest::cli::run::run(config_path, RunOverrides { listen, data_dir }).await?;
        }
        None => {
            streamhub_ingest::cli::run::run(config_path, RunOverrides::default()).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                streamhub_ingest::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                streamhub_ingest::cli::config::validate(config_path)?;
            }
        },
        Some(Commands::Loadgen {
            url,
            rate,
            batch,
            users,
            videos,
            count,
        }) => {
            let config = LoadgenConfig {
                url,
                rate,
                batch,
                users,
                videos,
                count,
            };
            tokio::select! {
                result = streamhub_ingest::loadgen::run(&config) => {
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Load generation stopped");
                }
            }
        }
    }

    Ok(())
}
