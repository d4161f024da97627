//! Pushbeam server
//!
//! HTTP surface for subscription registration and notification fan-out.
//!
//! ## Usage
//!
//! ```bash
//! # Run with defaults (127.0.0.1:5000, ~/.pushbeam/data)
//! pushbeam-server
//!
//! # Custom bind address and data directory
//! pushbeam-server --listen 0.0.0.0:8080 --data-dir /var/lib/pushbeam
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pushbeam_core::{Dispatcher, Storage, SubscriptionRegistry};
use pushbeam_server::{router, AppState, HttpPushProvider};

/// Pushbeam - push notification delivery server
#[derive(Parser)]
#[command(name = "pushbeam-server")]
#[command(version = "0.1.0")]
#[command(about = "Push notification delivery with durable subscriptions")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    listen: SocketAddr,

    /// Data directory (default: ~/.pushbeam/data)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pushbeam")
        .join("data")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let storage = Storage::new(data_dir.join("pushbeam.redb"))
        .with_context(|| format!("opening storage in {}", data_dir.display()))?;

    let registry = Arc::new(SubscriptionRegistry::new(storage.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        registry.clone(),
        Arc::new(HttpPushProvider::new()),
    ));

    let app = router(AppState {
        storage,
        registry,
        dispatcher,
    });

    info!(listen = %cli.listen, data_dir = %data_dir.display(), "pushbeam-server starting");
    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("binding {}", cli.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}
