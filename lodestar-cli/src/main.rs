use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod history;
mod session;
mod view;

/// Lodestar CLI for running research queries against a Lodestar server
#[derive(Debug, Parser)]
#[command(name = "lodestar", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a research query and follow its progress
    Research {
        /// The research query
        query: String,

        /// Base URL of the Lodestar server
        #[arg(short, long, env = "LODESTAR_SERVER", default_value = "http://localhost:3031")]
        server: String,

        /// Write the rendered HTML report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List past research queries
    History {
        /// Base URL of the Lodestar server
        #[arg(short, long, env = "LODESTAR_SERVER", default_value = "http://localhost:3031")]
        server: String,

        /// Show at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_target(false)
                .without_time(),
        )
        .with(indicatif_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lodestar=info")))
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Research {
            query,
            server,
            output,
        } => session::run_research(&server, &query, output).await,
        Commands::History { server, limit } => history::show_history(&server, limit).await,
    }
}
