//! artifact-daemon: Headless editing session for a streamed artifact.
//!
//! Reads producer stream parts and editor commands as JSON lines on stdin,
//! writes session events as JSON lines on stdout, and persists versions to a
//! directory of JSON history files.

use anyhow::Result;
use artifact_core::{ArtifactKind, EditingSession, SessionConfig};
use clap::Parser;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use artifact_daemon::config::{Config, ConfigArgs};
use artifact_daemon::{Daemon, FileStore};

#[derive(Parser, Debug)]
#[command(name = "artifact-daemon")]
#[command(about = "Streamed artifact editing session")]
struct Args {
    /// Directory for version history (falls back to ARTIFACT_STORE_PATH)
    #[arg(short, long)]
    store: Option<String>,

    /// Document ID to open (generated if not provided)
    #[arg(short, long)]
    document: Option<String>,

    /// Artifact kind: text, code or html
    #[arg(short, long, default_value = "text")]
    kind: ArtifactKind,

    /// Debounce quiet period in milliseconds (falls back to ARTIFACT_QUIET_PERIOD_MS)
    #[arg(long)]
    quiet_period_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the protocol
    let default_filter = if args.verbose {
        "debug,artifact_daemon=debug,artifact_core=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(ConfigArgs {
        store: args.store,
        quiet_period_ms: args.quiet_period_ms,
        document: args.document,
        kind: args.kind,
    })?;

    info!("Starting artifact-daemon");
    info!("Store path: {:?}", config.store_path);
    info!("Document: {} ({:?})", config.document_id, config.kind);
    info!("Quiet period: {:?}", config.quiet_period);

    let store = Arc::new(FileStore::new(config.store_path.clone()));
    let session = EditingSession::open(
        store,
        config.document_id,
        config.kind,
        SessionConfig {
            quiet_period: config.quiet_period,
        },
    )
    .await?;

    let daemon = Daemon::new(session);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    daemon
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown)
        .await?;

    info!("Shutting down");
    Ok(())
}
