//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the document store (from its JSON file when configured)
//! - Compile document types into the manager registry
//! - Build the HTTP server and run migrations
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binding is left to the caller so tests can pick ports

use thiserror::Error;

use crate::config::schema::StoreConfig;
use crate::config::AppConfig;
use crate::docs::memory::count_by_type;
use crate::docs::{ManagerRegistry, MemoryStore, StoreError};
use crate::http::HttpServer;
use crate::routing::matcher::PatternError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("document types: {0}")]
    Types(#[from] PatternError),
}

/// Open the configured store, or an empty in-memory one.
pub fn open_store(config: &StoreConfig) -> Result<MemoryStore, StoreError> {
    match &config.path {
        Some(path) => MemoryStore::load_from_file(path),
        None => Ok(MemoryStore::new(None)),
    }
}

/// Build a ready-to-run server over `store`.
pub async fn build_server(config: AppConfig, store: MemoryStore) -> Result<HttpServer, StartupError> {
    let managers = ManagerRegistry::from_config(&config.types)?;
    tracing::info!(
        types = managers.len(),
        documents = store.len(),
        by_type = ?count_by_type(&store),
        "Document store ready"
    );
    if managers.is_empty() {
        tracing::info!("No document types configured, every document is a page without dispatch rules");
    }
    if store.is_empty() {
        tracing::warn!("Document store is empty, every request will be not found");
    }

    let server = HttpServer::new(config, store, managers);
    server.migrate().await?;
    Ok(server)
}
