//! History recording.
//!
//! Runs after a page rendered and before the response is sent. Every served
//! document that has an address gets that address appended to its history,
//! unless it is already there.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::SoftRedirectConfig;
use crate::docs::{Document, DocumentStore, StoreResult};
use crate::observability::metrics;
use crate::redirects::url::local;

/// Appends served addresses to document histories.
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn DocumentStore>,
    config: SoftRedirectConfig,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn DocumentStore>, config: SoftRedirectConfig) -> Self {
        Self { store, config }
    }

    /// Record the current address of each served document.
    ///
    /// Documents are processed one at a time; the first store failure stops
    /// the batch and is returned. Returns how many addresses were new.
    pub async fn record(&self, served: &[&Document]) -> StoreResult<usize> {
        if !self.config.enable {
            return Ok(0);
        }

        let mut seen = HashSet::new();
        let mut recorded = 0;

        for doc in served {
            if !seen.insert(&doc.id) {
                continue;
            }
            let Some(url) = doc.url.as_deref() else {
                continue;
            };
            let url = local(url);
            if doc.historic_urls.contains(&url) {
                continue;
            }

            match self.store.add_historic_url(&doc.id, &url).await {
                Ok(inserted) => {
                    if inserted {
                        recorded += 1;
                        metrics::record_history_insert();
                        tracing::debug!(doc_id = %doc.id, url = %url, "Recorded historic url");
                    }
                }
                Err(e) => {
                    metrics::record_store_error("add_historic_url");
                    return Err(e);
                }
            }
        }

        Ok(recorded)
    }
}
