//! Pushbeam client CLI
//!
//! Thin wrapper around the capture client and replay controller for
//! command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # POST a JSON body; captured locally if the network is down
//! pushbeam-client post http://localhost:5000/sendNotification \
//!     --json '{"title":"Hi","body":"from the CLI"}'
//!
//! # Show pending outbox entries
//! pushbeam-client queue
//!
//! # Fire the sync trigger and drain the outbox
//! pushbeam-client sync
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pushbeam_client::{HttpReplayTransport, OfflineClient, SubmitStatus};
use pushbeam_core::{DrainOutcome, OutboxStore, ReplayController, OUTBOX_SYNC_TAG};

/// Pushbeam - offline-tolerant request client
#[derive(Parser)]
#[command(name = "pushbeam-client")]
#[command(version = "0.1.0")]
#[command(about = "Offline-tolerant HTTP client with a durable outbox")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.pushbeam/client)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// POST a JSON body, capturing it locally when the network is down
    Post {
        /// Target URL
        url: String,
        /// JSON body
        #[arg(long, default_value = "{}")]
        json: String,
    },

    /// List pending outbox entries
    Queue,

    /// Fire the sync trigger and drain the outbox
    Sync,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
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
        .join("client")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let outbox = OutboxStore::new(data_dir.join("outbox.redb"))
        .with_context(|| format!("opening outbox in {}", data_dir.display()))?;

    match cli.command {
        Commands::Post { url, json } => {
            let body: serde_json::Value =
                serde_json::from_str(&json).context("parsing --json body")?;
            let client = OfflineClient::new(outbox);
            match client.post_json(&url, &body).await? {
                SubmitStatus::Sent { status } => {
                    println!("sent: server answered {status}");
                }
                SubmitStatus::Queued { entry_id } => {
                    println!("queued: network unreachable, saved as entry {entry_id}");
                }
            }
        }

        Commands::Queue => {
            let pending = outbox.list_pending()?;
            if pending.is_empty() {
                println!("outbox is empty");
            } else {
                for entry in pending {
                    let enqueued = chrono::DateTime::from_timestamp(entry.enqueued_at, 0)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| entry.enqueued_at.to_string());
                    println!(
                        "{}  {}  {} bytes  {}",
                        entry.id,
                        entry.target_url,
                        entry.body.len(),
                        enqueued
                    );
                }
            }
        }

        Commands::Sync => {
            let controller =
                ReplayController::new(outbox, Arc::new(HttpReplayTransport::new()));
            match controller.on_sync_event(OUTBOX_SYNC_TAG).await? {
                DrainOutcome::Drained(summary) => {
                    println!(
                        "drained: {} attempted, {} delivered, {} kept for retry",
                        summary.attempted, summary.delivered, summary.failed
                    );
                }
                DrainOutcome::Coalesced => println!("drain already in progress"),
                DrainOutcome::Ignored => println!("trigger ignored"),
            }
        }
    }

    Ok(())
}
