//! # facetplan - Facet Render Planner
//!
//! The main binary for the facetplan rendering selector.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface over preferences files
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 apps/facetplan (THE BINARY)                 │
//! │                                                             │
//! │       ┌─────────────┐              ┌─────────────┐          │
//! │       │    CLI      │              │  HTTP API   │          │
//! │       │   (clap)    │              │   (axum)    │          │
//! │       └──────┬──────┘              └──────┬──────┘          │
//! │              │                            │                 │
//! │              └─────────────┬──────────────┘                 │
//! │                            ▼                                │
//! │                   ┌────────────────┐                        │
//! │                   │ facetplan-core │                        │
//! │                   │  (THE LOGIC)   │                        │
//! │                   └────────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server with startup preferences
//! facetplan server --host 0.0.0.0 --port 8080 -f preferences.json
//!
//! # CLI operations
//! facetplan plan -f preferences.json
//! facetplan resolve -f facet.json
//! facetplan granularity --range-ms 17280000000 --interval day
//! ```

use clap::Parser;
use facetplan::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // FACETPLAN_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("FACETPLAN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose {
        "facetplan=debug,facetplan_core=debug,tower_http=debug"
    } else {
        "facetplan=info,facetplan_core=warn,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
