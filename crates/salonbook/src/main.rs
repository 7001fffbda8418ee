// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Salonbook - appointment booking and call-ingestion backend for a salon.
//!
//! This is the binary entry point: it loads configuration, installs logging,
//! and dispatches to the subcommand modules.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check_config;
mod seed;
mod serve;
mod shutdown;
mod status;
mod sync_tools;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Salonbook - salon appointment booking over voice calls.
#[derive(Parser, Debug)]
#[command(name = "salonbook", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway (webhook, tools, CRUD API).
    Serve,
    /// Install the default services, staff, and schedules.
    Seed {
        /// Print the seed report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Push in-call tool definitions to the voice assistant.
    SyncTools {
        /// Print the definitions instead of sending them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration and check the database and credentials.
    CheckConfig {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Show whether a running gateway is healthy.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => salonbook_config::load_and_validate_path(path),
        None => salonbook_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            salonbook_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Seed { json }) => seed::run_seed(&config, json).await.map(|_| ()),
        Some(Commands::SyncTools { dry_run }) => sync_tools::run_sync_tools(&config, dry_run)
            .await
            .map(|_| ()),
        Some(Commands::CheckConfig { plain }) => {
            check_config::run_check_config(&config, plain).await
        }
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        None => {
            println!("salonbook: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to salonbook targets
/// and everything else logs at warn.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn default_filter(level: &str) -> EnvFilter {
    let directives = [
        "salonbook",
        "salonbook_config",
        "salonbook_storage",
        "salonbook_engine",
        "salonbook_voice",
        "salonbook_gateway",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect::<Vec<_>>()
    .join(",");
    EnvFilter::new(format!("warn,{directives},tower_http={level}"))
}
