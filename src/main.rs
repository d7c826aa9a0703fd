//! Servline command-line entry point.
//!
//! - `servline serve` runs the HTTP API.
//! - `servline check <TEXT>...` runs the location sanitizer on its arguments
//!   joined with spaces.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use servline::safety::{TextSanitizer, Verdict};
use servline::server::{self, AppState};
use servline::{ArcGisClient, Config};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "servline=info";

#[derive(Parser)]
#[command(name = "servline")]
#[command(version, about = "Service line data-entry backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen address (overrides SERVLINE_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// Emit logs as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Check a location description against the content filter
    Check {
        /// Text to check; multiple arguments are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, json } => {
            init_tracing(json);
            cmd_serve(bind).await
        }
        Command::Check { text } => {
            if !cmd_check(&text.join(" ")) {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

// ============================================================================
// serve
// ============================================================================

async fn cmd_serve(bind: Option<SocketAddr>) -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let addr = bind.unwrap_or(config.bind);

    info!(
        addr = %addr,
        points = %config.points_query_url,
        records = %config.records_query_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        "servline starting"
    );

    let client = ArcGisClient::new(&config).context("failed to build feature service client")?;
    let state = AppState::new(Arc::new(client));

    server::serve(addr, state)
        .await
        .with_context(|| format!("server on {} failed", addr))?;

    info!("servline stopped");
    Ok(())
}

// ============================================================================
// check
// ============================================================================

/// Print the verdict for `text`. Returns false on rejection.
fn cmd_check(text: &str) -> bool {
    match TextSanitizer::new().validate(text) {
        Verdict::Accepted(clean) => {
            println!("accepted: {}", clean);
            true
        }
        Verdict::Rejected(reason) => {
            println!("rejected: {}", reason);
            false
        }
    }
}
