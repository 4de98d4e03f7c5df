//! Soft redirects subsystem.
//!
//! # Data Flow
//! ```text
//! Page rendered (page and/or piece)
//!     → page_before_send → recorder.rs (append current url to history)
//!     → DocumentStore set-insert
//!
//! No page found
//!     → page_not_found → resolver.rs (ancestor paths → history query → best candidate)
//!     → Redirect { location, status } or pass-through to 404
//!
//! Startup migration
//!     → ensure_indexes → DocumentStore::ensure_index(historic urls)
//! ```
//!
//! # Design Decisions
//! - Configuration is handed in at construction, never read from globals
//! - When disabled, every hook is a no-op that never touches the store
//! - Store failures are returned to the caller, which decides the fallback

pub mod recorder;
pub mod resolver;
pub mod url;

use std::sync::Arc;

use crate::config::SoftRedirectConfig;
use crate::docs::{DocumentStore, IndexField, ManagerRegistry, StoreResult};
use crate::routing::Dispatched;

pub use recorder::HistoryRecorder;
pub use resolver::{Redirect, RedirectResolver};

/// The two soft-redirect hooks wired to one store.
#[derive(Clone)]
pub struct SoftRedirects {
    store: Arc<dyn DocumentStore>,
    config: SoftRedirectConfig,
    recorder: HistoryRecorder,
    resolver: RedirectResolver,
}

impl SoftRedirects {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        managers: Arc<ManagerRegistry>,
        config: SoftRedirectConfig,
    ) -> Self {
        Self {
            recorder: HistoryRecorder::new(store.clone(), config.clone()),
            resolver: RedirectResolver::new(store.clone(), managers, config.clone()),
            store,
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enable
    }

    /// Migration hook: index historic urls. Skipped when disabled.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        if !self.config.enable {
            return Ok(());
        }
        self.store.ensure_index(IndexField::HistoricUrls).await
    }

    /// Before-send hook: record the addresses of what was just rendered.
    pub async fn page_before_send(&self, rendered: &Dispatched) -> StoreResult<usize> {
        self.recorder.record(&rendered.served()).await
    }

    /// Not-found hook: find a redirect for `request_url`, if any.
    pub async fn page_not_found(&self, request_url: &str) -> StoreResult<Option<Redirect>> {
        self.resolver.resolve(request_url).await
    }
}
