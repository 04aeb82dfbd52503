//! CLI for retsq
//!
//! Subcommands mirror the server's operation families:
//! - query: paginated search against a resource/class
//! - histogram: count-only searches over contiguous date buckets
//! - metadata: system/resources/classes/table metadata
//! - objectquery: media objects for one record

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod output;
mod progress;

#[derive(Parser)]
#[command(name = "retsq")]
#[command(about = "retsq - RETS search client", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a search query to the server
    Query(commands::query::QueryArgs),

    /// Count matching records per date bucket
    Histogram(commands::histogram::HistogramArgs),

    /// Request metadata from the server
    Metadata(commands::metadata::MetadataArgs),

    /// Send a GetObject query to the server
    #[command(name = "objectquery")]
    ObjectQuery(commands::object::ObjectQueryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Query(args) => commands::query::run(args).await,
        Commands::Histogram(args) => commands::histogram::run(args).await,
        Commands::Metadata(args) => commands::metadata::run(args).await,
        Commands::ObjectQuery(args) => commands::object::run(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
