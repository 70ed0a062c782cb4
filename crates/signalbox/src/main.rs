// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signalbox - offline-first field signal capture.
//!
//! This is the binary entry point wiring the capture flow, the persisted
//! queue, and the live mirror to a command line.

mod app;
mod commands;
mod render;
mod shutdown;
mod status;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use signalbox_capture::Draft;
use signalbox_core::{FetchQuery, Identity, Priority, SignalError, SignalStatus};
use tracing::{error, warn};

use crate::app::App;

/// Signalbox - offline-first field signal capture.
#[derive(Parser, Debug)]
#[command(name = "signalbox", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a bearer token and identity, then deliver anything queued.
    Login {
        /// Bearer token. Prompted for when omitted.
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored credential and identity.
    Logout,
    /// Show connectivity, session, and queue state.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Capture a signal. Queued locally if it cannot be delivered now.
    Capture {
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        /// low, normal, or high.
        #[arg(long)]
        priority: Option<Priority>,
        /// Tag a restaurant. Repeatable.
        #[arg(long = "restaurant", value_name = "ID")]
        restaurants: Vec<String>,
    },
    /// List signals waiting in the local queue.
    Queue {
        #[arg(long)]
        json: bool,
    },
    /// Try to deliver every queued signal now.
    Drain,
    /// Fetch signals from the server.
    List {
        #[arg(long, default_value_t = 50)]
        limit: u32,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        author_email: Option<String>,
        #[arg(long)]
        status: Option<SignalStatus>,
        /// Follow pages until the server runs out.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Mirror the live feed and drain on reconnect until interrupted.
    Watch,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => signalbox_config::load_and_validate_path(path),
        None => signalbox_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            signalbox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    let app = match App::open(config).await {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to open local storage");
            eprintln!("signalbox: {e}");
            std::process::exit(1);
        }
    };

    let result = run(cli.command, &app).await;

    if let Err(e) = app.close().await {
        warn!(error = %e, "failed to close database cleanly");
    }
    if let Err(e) = result {
        eprintln!("signalbox: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, app: &App) -> Result<(), SignalError> {
    match command {
        Commands::Login {
            token,
            user_id,
            name,
            email,
        } => {
            let identity = Identity {
                id: user_id,
                name,
                email,
            };
            commands::login(app, token, identity).await
        }
        Commands::Logout => commands::logout(app).await,
        Commands::Status { json, plain } => {
            status::run_status(app, json, plain).await;
            Ok(())
        }
        Commands::Capture {
            title,
            body,
            priority,
            restaurants,
        } => {
            let draft = Draft {
                title,
                body,
                priority,
                restaurant_ids: restaurants,
            };
            commands::capture(app, draft).await
        }
        Commands::Queue { json } => {
            commands::show_queue(app, json).await;
            Ok(())
        }
        Commands::Drain => commands::drain(app).await,
        Commands::List {
            limit,
            offset,
            author_email,
            status,
            all,
            json,
        } => {
            let query = FetchQuery {
                limit: Some(limit),
                offset,
                author_email,
                status,
            };
            commands::list(app, query, all, json).await
        }
        Commands::Watch => {
            let cancel = shutdown::install_signal_handler();
            watch::run_watch(app, cancel).await;
            Ok(())
        }
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the config file.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("signalbox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
