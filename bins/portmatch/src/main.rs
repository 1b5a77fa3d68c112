//! portmatch - resolve free-form port names and coordinates
//!
//! Looks names up in the bundled port datasets and the local ports cache,
//! falling back to an online geocoder for names nothing local recognises.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use portmatch_core::config::Config;
use portmatch_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod app;
mod commands;

use app::{App, AppOptions};
use commands::{batch, cache, nearest, resolve, search};

/// Port name resolution with a persistent lookup cache
#[derive(Parser)]
#[command(name = "portmatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a portmatch.toml
    #[arg(short, long, global = true, env = "PORTMATCH_CONFIG")]
    config: Option<String>,

    /// Replace the bundled master port list with a JSON file
    #[arg(long, global = true)]
    master_file: Option<PathBuf>,

    /// Never call the online geocoder
    #[arg(long, global = true)]
    offline: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one name or "lat, lng" to its best port
    Resolve {
        /// Free-form port name or coordinates
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ranked candidates for a query
    Search {
        /// Free-form port name or coordinates
        query: String,

        /// Maximum number of candidates
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve every line of a file
    Batch {
        /// File with one port name per line; `#` starts a comment
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Known ports closest to a coordinate
    #[command(allow_negative_numbers = true)]
    Nearest {
        /// Latitude in degrees
        lat: f64,

        /// Longitude in degrees
        lng: f64,

        /// Maximum number of ports
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit the ports cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached ports, most recently used first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show cache size and age
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove cached ports by name
    Remove {
        /// Port name
        name: String,
    },

    /// Drop every cached port
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;

    let level = if cli.verbose {
        "warn,portmatch=debug,portmatch_ports=debug,portmatch_geocoder=debug".to_string()
    } else {
        config.schema.logging.level.clone()
    };
    portmatch_telemetry::init_with_config(&TelemetryConfig::with_level(level))?;

    let options = AppOptions {
        offline: cli.offline,
        master_file: cli.master_file,
    };
    let app = App::build(config, &options)?;

    match cli.command {
        Commands::Resolve { query, json } => resolve::run(&app, &query, json).await,
        Commands::Search { query, limit, json } => search::run(&app, &query, limit, json).await,
        Commands::Batch { file, json } => batch::run(&app, &file, json).await,
        Commands::Nearest { lat, lng, limit, json } => nearest::run(&app, lat, lng, limit, json),
        Commands::Cache { action } => match action {
            CacheAction::List { json } => cache::list(&app, json).await,
            CacheAction::Stats { json } => cache::stats(&app, json).await,
            CacheAction::Remove { name } => cache::remove(&app, &name).await,
            CacheAction::Clear => cache::clear(&app).await,
        },
    }
}
