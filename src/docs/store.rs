//! Document store interface.
//!
//! The soft-redirect core only needs a handful of operations from the store:
//! an intersect query over historic URLs, an atomic set-insert, and an index
//! hint. The remaining operations exist for the page dispatcher and for
//! moving documents.

use async_trait::async_trait;
use thiserror::Error;

use crate::docs::model::{Document, DocumentId};

/// Errors surfaced by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Fields that can be indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexField {
    HistoricUrls,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents whose history intersects `urls`, most recently updated first.
    async fn find_by_historic_urls(&self, urls: &[String]) -> StoreResult<Vec<Document>>;

    /// Documents whose current address is one of `urls`, most recently updated first.
    async fn find_by_urls(&self, urls: &[String]) -> StoreResult<Vec<Document>>;

    /// Set-insert `url` into the document's history. Returns false if it was already there.
    async fn add_historic_url(&self, id: &DocumentId, url: &str) -> StoreResult<bool>;

    /// Make sure queries on `field` are indexed. Idempotent.
    async fn ensure_index(&self, field: IndexField) -> StoreResult<()>;

    async fn insert(&self, doc: Document) -> StoreResult<()>;

    async fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// Change a document's current address. History is left untouched.
    async fn move_to(&self, id: &DocumentId, url: &str) -> StoreResult<Document>;
}
