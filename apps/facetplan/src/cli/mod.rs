//! # facetplan CLI Module
//!
//! ## Available Commands
//!
//! - `plan` - Plan every facet of a preferences document
//! - `resolve` - Resolve the rendering mode of one facet entry
//! - `granularity` - Run the bucket-size estimator
//! - `validate` - Normalize a preferences document and report errors
//! - `server` - Start the HTTP server

mod commands;

use clap::{Parser, Subcommand};
use facetplan_core::FacetError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// facetplan - facet render planner
///
/// Decides how each storefront facet renders (list, bounded range or dynamic
/// range) and sizes date histogram buckets.
#[derive(Parser, Debug)]
#[command(name = "facetplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan every facet of a preferences document
    Plan {
        /// Path to the preferences JSON document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Resolve the rendering mode of one facet entry ({rsConfig, customMessages})
    Resolve {
        /// Path to the facet entry JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Pick a calendar interval for a date range
    Granularity {
        /// Width of the date range in milliseconds
        #[arg(short, long)]
        range_ms: u64,

        /// Requested interval (minute, hour, day, week, month, quarter, year)
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// Normalize a preferences document and report errors
    Validate {
        /// Path to the preferences JSON document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Start HTTP server
    Server {
        /// Host to bind to (default: 127.0.0.1)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (default: 8080)
        #[arg(short, long)]
        port: Option<u16>,

        /// Preferences document served by `GET /plan`
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Server configuration file (default: ./facetplan.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), FacetError> {
    let output = Output {
        json_mode: cli.json_mode,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Plan { file } => cmd_plan(&file, output),
        Commands::Resolve { file } => cmd_resolve(&file, output),
        Commands::Granularity { range_ms, interval } => {
            cmd_granularity(range_ms, interval.as_deref(), output)
        }
        Commands::Validate { file } => cmd_validate(&file, output),
        Commands::Server {
            host,
            port,
            file,
            config,
        } => cmd_server(host, port, file, config, output).await,
    }
}
