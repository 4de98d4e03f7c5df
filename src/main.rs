//! Soft-redirect site server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Request ──▶ http::server ──▶ routing::PageRouter ──found──▶ render ──▶ page_before_send ──▶ 200
//!                                          │                                     │
//!                                      not found                         redirects::recorder
//!                                          │                                     │
//!                                          ▼                                     ▼
//!                               redirects::resolver ◀────── docs::DocumentStore (historic urls)
//!                                          │
//!                              redirect (302/301...) or 404
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use soft_redirects::config::{load_config, AppConfig};
use soft_redirects::lifecycle::signals::shutdown_signal;
use soft_redirects::lifecycle::startup::{build_server, open_store};
use soft_redirects::lifecycle::Shutdown;
use soft_redirects::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "soft-redirects")]
#[command(about = "Serve documents and redirect requests for moved ones", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("soft-redirects v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        enable = config.soft_redirects.enable,
        status_code = config.soft_redirects.status_code,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = open_store(&config.store)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = build_server(config, store).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
