//! # Lodestar Server
//!
//! The Lodestar server runs research operations and streams their progress
//! to clients. A query goes through four stages: source discovery (web
//! search), content extraction (fetch + readability-style extraction +
//! relevance filtering), per-source summarization, and report generation.
//!
//! ## API
//!
//! - `GET /api/health`: liveness check
//! - `GET /api/research/stream?query=...`: runs a research operation and
//!   pushes progress, then the final report or an error, as SSE events
//! - `GET /api/history`: completed operations, newest first (in-memory,
//!   gone on restart)
//!
//! ## Crate Organization
//!
//! - **api/**: HTTP routes (health, research stream, history)
//! - **agent.rs**: the research pipeline
//! - **providers.rs**: search, text-generation and page-fetch backends
//! - **extract.rs**: readability-like text extraction
//! - **progress.rs**: progress fan-out to the event stream
//! - **history.rs**: in-memory history store
//! - **config.rs**: configuration management
//! - **main.rs**: entry point and server setup

use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use clap::Parser;
use config::Config;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agent::ResearchAgent;
use history::HistoryStore;
use providers::default_providers;

mod agent;
mod api;
mod config;
mod error;
mod extract;
mod history;
mod progress;
mod providers;

/// Research server for the Lodestar assistant
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// API key for the Gemini model API
    #[arg(long, env = "GEMINI_API_KEY")]
    gemini_api_key: String,

    /// API key for the Tavily search API
    #[arg(long, env = "TAVILY_API_KEY")]
    tavily_api_key: String,

    /// Gemini model used for extraction, summaries and reports
    #[arg(long, env = "LODESTAR_GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    gemini_model: String,

    /// Maximum number of sources per query
    #[arg(long, env = "LODESTAR_MAX_SOURCES", default_value = "3")]
    max_sources: usize,

    /// Host address to bind to
    #[arg(long, env = "LODESTAR_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "LODESTAR_PORT", default_value = "3031")]
    port: u16,

    /// Logging level (info, debug, trace)
    #[arg(long, env = "LODESTAR_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

type ApiContextRef = Arc<ApiContext>;

pub struct ApiContext {
    pub agent: ResearchAgent,
    pub history: HistoryStore,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = Level::from_str(cli.log_level.to_lowercase().as_str()).unwrap_or(Level::INFO);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    info!(
        version = %env!("CARGO_PKG_VERSION"),
        "Starting Lodestar server"
    );

    let config = match Config::try_new(
        cli.gemini_api_key,
        cli.tavily_api_key,
        cli.gemini_model,
        cli.max_sources,
    ) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let (search, generator, fetcher) = match default_providers(&config) {
        Ok(providers) => providers,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        model = %config.gemini_model,
        max_sources = config.max_sources,
        "Configuration validated successfully"
    );

    let context = Arc::new(ApiContext {
        agent: ResearchAgent::new(
            Arc::new(search),
            Arc::new(generator),
            Arc::new(fetcher),
            config.max_sources,
        ),
        history: HistoryStore::new(),
    });

    // Create shutdown signal handler
    let shutdown_token = CancellationToken::new();
    let shutdown_token_ = shutdown_token.clone();

    tokio::spawn(async move {
        handle_shutdown_signals(shutdown_token_).await;
    });

    let app = api::router().with_state(context);

    let addr: SocketAddr = match format!("{}:{}", cli.host, cli.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse socket address: {}", e);
            std::process::exit(1);
        }
    };

    info!(addr = %addr, "Listening for connections");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server started, press Ctrl+C to stop");
    let server_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_token))
        .await;

    match server_result {
        Ok(_) => info!("Server shut down gracefully"),
        Err(e) => error!(error = %e, "Server error during shutdown"),
    }

    info!("Lodestar server shutdown complete");
}

/// Handler function for shutdown signals
async fn handle_shutdown_signals(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    shutdown_token.cancel();
}

/// Returns a future that resolves when the shutdown signal is received
async fn shutdown_signal_handler(token: CancellationToken) {
    token.cancelled().await;
    info!("Shutdown signal received, starting graceful shutdown");

    // Give in-flight requests some time to complete
    tokio::time::sleep(Duration::from_secs(1)).await;
}
