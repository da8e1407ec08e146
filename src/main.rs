//! nsoh-rollback-tracker entry point.
//!
//! `check` (the default) runs one detection cycle and exits with a status
//! describing the outcome; `serve` starts the read-only dashboard API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nsoh_rollback_tracker::api;
use nsoh_rollback_tracker::app_state::AppState;
use nsoh_rollback_tracker::config::TrackerConfig;
use nsoh_rollback_tracker::error::TrackerError;
use nsoh_rollback_tracker::fetch::{NsohFetcher, ThamesFetcher, build_http_client};
use nsoh_rollback_tracker::persistence::FileStore;
use nsoh_rollback_tracker::service::{CycleOutcome, CycleService};

#[derive(Parser, Debug)]
#[command(version, about = "Detects timestamp rollbacks in the NSOH storm overflow feed")]
struct Cli {
    /// Data directory; overrides `DATA_DIR`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one detection cycle (default).
    Check,
    /// Serve the dashboard API over the stored state.
    Serve {
        /// Bind address; overrides `LISTEN_ADDR`.
        #[arg(long)]
        listen_addr: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match TrackerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::from(err.exit_code());
        }
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    match cli.command.unwrap_or(Command::Check) {
        Command::Check => match check(&config).await {
            Ok(outcome) => ExitCode::from(outcome.exit_code()),
            Err(err) => {
                tracing::error!(error = %err, "detection cycle failed");
                ExitCode::from(err.exit_code())
            }
        },
        Command::Serve { listen_addr } => {
            if let Some(addr) = listen_addr {
                config.listen_addr = addr;
            }
            match serve(&config).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    tracing::error!(error = ?err, "server failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn check(config: &TrackerConfig) -> Result<CycleOutcome, TrackerError> {
    let client = build_http_client(config.request_timeout())?;
    let retry = config.retry_policy();

    let service = CycleService::new(
        NsohFetcher::new(
            client.clone(),
            &config.nsoh_arcgis_url,
            config.arcgis_page_size,
            retry,
        ),
        ThamesFetcher::new(client, &config.thames_api_url, retry),
        FileStore::new(&config.data_dir),
    );

    let outcome = service.run_cycle().await?;
    if let CycleOutcome::Baseline { primary_records, .. } = &outcome {
        tracing::info!(primary_records, "baseline saved, run again to detect rollbacks");
    }
    Ok(outcome)
}

async fn serve(config: &TrackerConfig) -> anyhow::Result<()> {
    let state = AppState::new(FileStore::new(&config.data_dir));
    let app = api::build_app(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, data_dir = %config.data_dir.display(), "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
