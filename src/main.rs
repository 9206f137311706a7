//! perf-overlay — live frame-time and counter overlay in the terminal.
//!
//! Run with:  `RUST_LOG=info perf-overlay [CONFIG]`

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Live frame-time and counter overlay.
#[derive(Debug, Parser)]
#[command(name = "perf-overlay", version, about)]
struct Cli {
    /// Path to the overlay config (default: $XDG_CONFIG_HOME/perf-overlay/overlay.toml).
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Structured logging on stderr — stdout belongs to the overlay.
    // RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("perf-overlay v{} starting", env!("CARGO_PKG_VERSION"));

    overlay_terminal::run(cli.config).await.map_err(Into::into)
}
