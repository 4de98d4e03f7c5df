//! Page lookup and dispatch.
//!
//! # Responsibilities
//! - Find the document whose current address owns the request path
//! - Apply the document type's dispatch rules to whatever follows that address
//! - Attach the enclosing page when the matched document is a piece
//! - Return the dispatched documents or an explicit no-match
//!
//! # Design Decisions
//! - Deepest address wins, recency breaks ties (store order)
//! - A type without rules only answers at its exact address
//! - Explicit NoMatch (None) rather than silent default

use std::cmp::Reverse;
use std::sync::Arc;

use crate::docs::{DocKind, Document, DocumentStore, ManagerRegistry, StoreResult};
use crate::redirects::url::{clean_request_url, prefix_segments, segment_count};
use crate::routing::matcher::Params;

/// What a request dispatched to.
#[derive(Debug, Clone, Default)]
pub struct Dispatched {
    pub page: Option<Document>,
    pub piece: Option<Document>,
    /// Parameters captured by the dispatch rule, if any.
    pub params: Params,
}

impl Dispatched {
    /// A plain page with no parameters.
    pub fn page(page: Document) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Documents involved in the response, page first.
    pub fn served(&self) -> Vec<&Document> {
        self.page.iter().chain(self.piece.iter()).collect()
    }

    /// The document the request addressed.
    pub fn primary(&self) -> Option<&Document> {
        self.piece.as_ref().or(self.page.as_ref())
    }
}

/// Maps request paths to documents.
#[derive(Clone)]
pub struct PageRouter {
    store: Arc<dyn DocumentStore>,
    managers: Arc<ManagerRegistry>,
}

impl PageRouter {
    pub fn new(store: Arc<dyn DocumentStore>, managers: Arc<ManagerRegistry>) -> Self {
        Self { store, managers }
    }

    /// Look up what `request_url` renders.
    pub async fn dispatch(&self, request_url: &str) -> StoreResult<Option<Dispatched>> {
        let clean = clean_request_url(request_url);
        let prefixes = prefix_segments(&clean);

        let mut owners = self.store.find_by_urls(&prefixes).await?;
        // Stable: recency order survives among equally deep addresses.
        owners.sort_by_key(|doc| Reverse(doc.url.as_deref().map_or(0, segment_count)));

        for (i, doc) in owners.iter().enumerate() {
            let Some(url) = doc.url.as_deref() else {
                continue;
            };
            let remainder = &clean[url.len()..];
            let Some(params) = self.accept(doc, remainder) else {
                continue;
            };

            let dispatched = match self.managers.kind_of(&doc.doc_type) {
                DocKind::Page => Dispatched {
                    page: Some(doc.clone()),
                    piece: None,
                    params,
                },
                DocKind::Piece => Dispatched {
                    page: owners[i + 1..]
                        .iter()
                        .find(|d| self.managers.kind_of(&d.doc_type) == DocKind::Page)
                        .cloned(),
                    piece: Some(doc.clone()),
                    params,
                },
            };
            return Ok(Some(dispatched));
        }

        Ok(None)
    }

    fn accept(&self, doc: &Document, remainder: &str) -> Option<Params> {
        match self.managers.get(&doc.doc_type) {
            Some(manager) if manager.has_rules() => manager.dispatch(remainder),
            _ if remainder.is_empty() => Some(Params::new()),
            _ => None,
        }
    }
}
