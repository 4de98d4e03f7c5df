//! In-memory document store with optional JSON persistence.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::docs::model::{now_millis, Document, DocumentId};
use crate::docs::store::{DocumentStore, IndexField, StoreError, StoreResult};

/// A thread-safe document store.
///
/// Each document lives in a `DashMap` shard, so a history set-insert holds
/// that shard's write lock and is atomic with respect to other writers.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<DashMap<DocumentId, Document>>,
    /// historic url -> ids of documents that answered to it.
    historic_index: Arc<DashMap<String, HashSet<DocumentId>>>,
    historic_indexed: Arc<AtomicBool>,
    persistence_path: Option<String>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Load from file if it exists, otherwise start empty.
    pub fn load_from_file(path: &str) -> StoreResult<Self> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let reader = BufReader::new(File::open(path)?);
            let docs: Vec<Document> = serde_json::from_reader(reader)?;
            for doc in docs {
                store.put(doc);
            }
            tracing::info!(count = store.len(), path, "Loaded documents from file");
        }
        Ok(store)
    }

    /// Save to file, if a persistence path was configured.
    pub fn save_to_file(&self) -> StoreResult<()> {
        if let Some(path) = &self.persistence_path {
            let mut docs: Vec<Document> = self.docs.iter().map(|r| r.value().clone()).collect();
            docs.sort_by(|a, b| a.id.cmp(&b.id));

            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &docs)?;
            tracing::info!(count = docs.len(), path = %path, "Saved documents to file");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Whether the historic-url index has been ensured.
    pub fn is_historic_indexed(&self) -> bool {
        self.historic_indexed.load(Ordering::Acquire)
    }

    fn put(&self, doc: Document) {
        if let Some((_, replaced)) = self.docs.remove(&doc.id) {
            for url in &replaced.historic_urls {
                if let Some(mut ids) = self.historic_index.get_mut(url) {
                    ids.remove(&replaced.id);
                }
                self.historic_index.remove_if(url, |_, ids| ids.is_empty());
            }
        }
        for url in &doc.historic_urls {
            self.historic_index
                .entry(url.clone())
                .or_default()
                .insert(doc.id.clone());
        }
        self.docs.insert(doc.id.clone(), doc);
    }

    fn collect_sorted<I>(&self, ids: I) -> Vec<Document>
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let mut found: Vec<Document> = ids
            .into_iter()
            .filter_map(|id| self.docs.get(&id).map(|r| r.value().clone()))
            .collect();
        sort_most_recent_first(&mut found);
        found
    }
}

/// Most recently updated first; equal timestamps fall back to id order.
fn sort_most_recent_first(docs: &mut [Document]) {
    docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_historic_urls(&self, urls: &[String]) -> StoreResult<Vec<Document>> {
        if self.is_historic_indexed() {
            let mut ids = HashSet::new();
            for url in urls {
                if let Some(entry) = self.historic_index.get(url) {
                    ids.extend(entry.value().iter().cloned());
                }
            }
            return Ok(self.collect_sorted(ids));
        }

        let mut found: Vec<Document> = self
            .docs
            .iter()
            .filter(|r| urls.iter().any(|u| r.value().historic_urls.contains(u)))
            .map(|r| r.value().clone())
            .collect();
        sort_most_recent_first(&mut found);
        Ok(found)
    }

    async fn find_by_urls(&self, urls: &[String]) -> StoreResult<Vec<Document>> {
        let mut found: Vec<Document> = self
            .docs
            .iter()
            .filter(|r| {
                r.value()
                    .url
                    .as_ref()
                    .is_some_and(|current| urls.iter().any(|u| u == current))
            })
            .map(|r| r.value().clone())
            .collect();
        sort_most_recent_first(&mut found);
        Ok(found)
    }

    async fn add_historic_url(&self, id: &DocumentId, url: &str) -> StoreResult<bool> {
        let inserted = {
            let mut doc = self
                .docs
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            doc.historic_urls.insert(url.to_string())
        };
        if inserted {
            self.historic_index
                .entry(url.to_string())
                .or_default()
                .insert(id.clone());
        }
        Ok(inserted)
    }

    async fn ensure_index(&self, field: IndexField) -> StoreResult<()> {
        match field {
            IndexField::HistoricUrls => {
                if !self.historic_indexed.swap(true, Ordering::AcqRel) {
                    tracing::debug!(entries = self.historic_index.len(), "Historic url index ready");
                }
            }
        }
        Ok(())
    }

    async fn insert(&self, doc: Document) -> StoreResult<()> {
        self.put(doc);
        Ok(())
    }

    async fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.docs.get(id).map(|r| r.value().clone()))
    }

    async fn move_to(&self, id: &DocumentId, url: &str) -> StoreResult<Document> {
        let mut doc = self
            .docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        doc.url = Some(url.to_string());
        doc.updated_at = now_millis().max(doc.updated_at + 1);
        Ok(doc.clone())
    }
}

/// Snapshot of the store grouped by type, for logging at startup.
pub fn count_by_type(store: &MemoryStore) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for r in store.docs.iter() {
        *counts.entry(r.value().doc_type.clone()).or_insert(0) += 1;
    }
    counts
}
