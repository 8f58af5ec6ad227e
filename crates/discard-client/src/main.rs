//! # Discard
//!
//! Terminal client for the Discard realtime event stream.
//!
//! ## Usage
//!
//! ```bash
//! # Connect to a local server and join #general
//! discard --origin http://localhost:8080 --channel general
//!
//! # Run with custom config
//! discard --config /path/to/discard.toml
//!
//! # Run with environment variables
//! DISCARD_ORIGIN=https://chat.example.com DISCARD_CHANNELS=general,random discard
//! ```
//!
//! Type a line to post it to the active channel. Commands: `/join <id>`,
//! `/leave <id>`, `/online`, `/unread`, `/quit`.

mod commands;
mod config;
mod handlers;
mod metrics;
mod reconnect;
mod view;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "discard", version, about = "Terminal client for the Discard realtime event stream")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Origin of the chat web app, e.g. https://chat.example.com.
    #[arg(short, long)]
    origin: Option<String>,

    /// Channel to subscribe to; repeat for more. The first is active.
    #[arg(long = "channel", value_name = "ID")]
    channels: Vec<String>,

    /// Exit when the connection closes instead of reconnecting.
    #[arg(long)]
    no_reconnect: bool,
}

impl Cli {
    /// Apply command line overrides on top of the loaded config.
    fn apply(self, mut config: config::Config) -> config::Config {
        if let Some(origin) = self.origin {
            config.origin = origin;
        }
        if !self.channels.is_empty() {
            config.channels = self.channels;
        }
        if self.no_reconnect {
            config.reconnect.enabled = false;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(cli.config.as_deref())?;
    let config = cli.apply(config);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(origin = %config.origin, channels = ?config.channels, "Starting Discard client");

    // Initialize metrics
    metrics::init_metrics();

    handlers::run_client(config).await?;

    Ok(())
}
