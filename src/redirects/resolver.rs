//! Not-found resolution.
//!
//! # Responsibilities
//! - Break the failing path into its ancestor paths, longest first
//! - Find documents that answered to any of them in the past
//! - Keep the candidate with the deepest historic match
//! - Check the rewritten address would be routable for the document's type
//! - Refuse redirects that point back at the request
//!
//! # Design Decisions
//! - Match depth is the primary key, store order (recency) only breaks ties
//! - Only the remainder past the matched prefix is checked against dispatch rules
//! - A rejected candidate never lowers the bar for weaker ones

use std::sync::Arc;

use axum::http::StatusCode;

use crate::config::SoftRedirectConfig;
use crate::docs::{Document, DocumentStore, ManagerRegistry, StoreResult};
use crate::observability::metrics;
use crate::redirects::url::{clean_request_url, local, prefix_segments, segment_count};

/// A redirect the pipeline should emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Value for the `Location` header.
    pub location: String,
    pub status: StatusCode,
}

/// Finds where a moved document lives now.
#[derive(Clone)]
pub struct RedirectResolver {
    store: Arc<dyn DocumentStore>,
    managers: Arc<ManagerRegistry>,
    enabled: bool,
    status: StatusCode,
}

impl RedirectResolver {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        managers: Arc<ManagerRegistry>,
        config: SoftRedirectConfig,
    ) -> Self {
        let status = StatusCode::from_u16(config.status_code)
            .ok()
            .filter(StatusCode::is_redirection)
            .unwrap_or(StatusCode::FOUND);
        Self {
            store,
            managers,
            enabled: config.enable,
            status,
        }
    }

    /// Resolve a request target that found no page.
    ///
    /// `Ok(None)` means ordinary not-found handling should continue.
    pub async fn resolve(&self, request_url: &str) -> StoreResult<Option<Redirect>> {
        if !self.enabled {
            return Ok(None);
        }

        let clean = clean_request_url(request_url);
        let prefixes = prefix_segments(&clean);

        let candidates = match self.store.find_by_historic_urls(&prefixes).await {
            Ok(candidates) => candidates,
            Err(e) => {
                metrics::record_store_error("find_by_historic_urls");
                return Err(e);
            }
        };

        let mut longest_match = 0;
        let mut redirect_url: Option<String> = None;

        for candidate in &candidates {
            let Some(historic) = longest_historic_match(candidate, &prefixes) else {
                tracing::debug!(doc_id = %candidate.id, "Candidate has no overlapping history, skipping");
                continue;
            };

            let match_length = segment_count(historic);
            if match_length <= longest_match {
                continue;
            }

            let Some(current) = candidate.url.as_deref() else {
                continue;
            };

            // `historic` is one of the prefixes of `clean`.
            let remainder = &clean[historic.len()..];
            if !self.is_routable(candidate, remainder) {
                tracing::debug!(
                    doc_id = %candidate.id,
                    historic = %historic,
                    remainder = %remainder,
                    "No dispatch rule accepts remainder, rejecting candidate"
                );
                continue;
            }

            redirect_url = Some(format!("{current}{remainder}"));
            longest_match = match_length;
        }

        match redirect_url {
            Some(location) if local(&location) != clean => {
                metrics::record_redirect(self.status.as_u16());
                tracing::info!(path = %clean, location = %location, status = self.status.as_u16(), "Soft redirect");
                Ok(Some(Redirect {
                    location,
                    status: self.status,
                }))
            }
            _ => {
                metrics::record_redirect_miss();
                Ok(None)
            }
        }
    }

    fn is_routable(&self, candidate: &Document, remainder: &str) -> bool {
        self.managers
            .get(&candidate.doc_type)
            .map_or(true, |manager| manager.accepts(remainder))
    }
}

/// The deepest entry of the document's history that is one of `prefixes`.
fn longest_historic_match<'a>(doc: &'a Document, prefixes: &[String]) -> Option<&'a str> {
    doc.historic_urls
        .iter()
        .filter(|url| prefixes.contains(*url))
        .max_by_key(|url| segment_count(url))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{DocKind, DocManager, DocumentId, IndexField, MemoryStore, StoreError};
    use async_trait::async_trait;

    fn doc(id: &str, doc_type: &str, url: &str, history: &[&str], updated_at: u64) -> Document {
        let mut doc = Document::new(doc_type, id, Some(url))
            .with_id(id)
            .with_history(history.iter().copied());
        doc.updated_at = updated_at;
        doc
    }

    fn custom_pages() -> ManagerRegistry {
        let mut registry = ManagerRegistry::new();
        registry.register(
            "custom-page",
            DocManager::from_patterns(DocKind::Page, &["/", "/:param1/:param2?"]).unwrap(),
        );
        registry
    }

    async fn resolver_with(
        docs: Vec<Document>,
        registry: ManagerRegistry,
        config: SoftRedirectConfig,
    ) -> RedirectResolver {
        let store = MemoryStore::new(None);
        store.ensure_index(IndexField::HistoricUrls).await.unwrap();
        for d in docs {
            store.insert(d).await.unwrap();
        }
        RedirectResolver::new(Arc::new(store), Arc::new(registry), config)
    }

    async fn location(resolver: &RedirectResolver, url: &str) -> Option<String> {
        resolver.resolve(url).await.unwrap().map(|r| r.location)
    }

    #[tokio::test]
    async fn test_simple_move() {
        let resolver = resolver_with(
            vec![doc("child", "default", "/child-moved", &["/child"], 1)],
            ManagerRegistry::new(),
            SoftRedirectConfig::default(),
        )
        .await;

        let redirect = resolver.resolve("/child?x=1").await.unwrap().unwrap();
        assert_eq!(redirect.location, "/child-moved");
        assert_eq!(redirect.status, StatusCode::FOUND);
        assert_eq!(location(&resolver, "/unknown").await, None);
    }

    #[tokio::test]
    async fn test_absolute_request_url() {
        let resolver = resolver_with(
            vec![doc("child", "default", "/child-moved", &["/child"], 1)],
            ManagerRegistry::new(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(
            location(&resolver, "http://localhost:7900/child").await.as_deref(),
            Some("/child-moved")
        );
        assert_eq!(
            location(&resolver, "https://example.com/child/sub?x=1").await.as_deref(),
            Some("/child-moved/sub")
        );
    }

    #[tokio::test]
    async fn test_longest_match_beats_recency() {
        let resolver = resolver_with(
            vec![
                doc("deep", "default", "/new-deep", &["/a/b"], 1),
                doc("shallow", "default", "/new-shallow", &["/a"], 2),
            ],
            ManagerRegistry::new(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(location(&resolver, "/a/b/c").await.as_deref(), Some("/new-deep/c"));
        assert_eq!(location(&resolver, "/a/x").await.as_deref(), Some("/new-shallow/x"));
    }

    #[tokio::test]
    async fn test_equal_length_prefers_most_recent() {
        let resolver = resolver_with(
            vec![
                doc("older", "default", "/older", &["/shared"], 1),
                doc("newer", "default", "/newer", &["/shared"], 2),
            ],
            ManagerRegistry::new(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(location(&resolver, "/shared").await.as_deref(), Some("/newer"));
    }

    #[tokio::test]
    async fn test_segments_not_characters() {
        let resolver = resolver_with(
            vec![
                doc("long-name", "default", "/one", &["/a-very-long-segment"], 2),
                doc("two-deep", "default", "/two", &["/a-very-long-segment/b"], 1),
            ],
            ManagerRegistry::new(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(
            location(&resolver, "/a-very-long-segment/b").await.as_deref(),
            Some("/two")
        );
    }

    #[tokio::test]
    async fn test_loop_prevention() {
        let resolver = resolver_with(
            vec![doc("same", "default", "/child", &["/child"], 1)],
            ManagerRegistry::new(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(location(&resolver, "/child").await, None);
        assert_eq!(location(&resolver, "/child/extra").await, None);
    }

    #[tokio::test]
    async fn test_loop_prevention_with_absolute_url() {
        let resolver = resolver_with(
            vec![doc("same", "default", "https://example.com/child", &["/child"], 1)],
            ManagerRegistry::new(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(location(&resolver, "/child").await, None);
    }

    #[tokio::test]
    async fn test_dispatch_rules_gate_candidates() {
        let resolver = resolver_with(
            vec![
                doc(
                    "child",
                    "custom-page",
                    "/child-moved/deeply",
                    &["/child", "/child-moved", "/child/moved"],
                    2,
                ),
                doc("child2", "custom-page", "/child-2", &["/child"], 1),
            ],
            custom_pages(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(
            location(&resolver, "/child-moved/param1").await.as_deref(),
            Some("/child-moved/deeply/param1")
        );
        assert_eq!(
            location(&resolver, "/child/moved").await.as_deref(),
            Some("/child-moved/deeply")
        );
        assert_eq!(
            location(&resolver, "/child/moved/param1").await.as_deref(),
            Some("/child-moved/deeply/param1")
        );
        assert_eq!(
            location(&resolver, "/child/moved/param1/param2/toomanyparams").await,
            None
        );
    }

    #[tokio::test]
    async fn test_rejected_candidate_does_not_block_weaker_match() {
        // Deep match is rejected by its rules; the shallower document without
        // rules still qualifies.
        let resolver = resolver_with(
            vec![
                doc("strict", "custom-page", "/strict", &["/a/b"], 2),
                doc("loose", "default", "/loose", &["/a"], 1),
            ],
            custom_pages(),
            SoftRedirectConfig::default(),
        )
        .await;

        assert_eq!(
            location(&resolver, "/a/b/c/d/e").await.as_deref(),
            Some("/loose/b/c/d/e")
        );
    }

    #[tokio::test]
    async fn test_status_code_configurable() {
        let resolver = resolver_with(
            vec![doc("child", "default", "/child-moved", &["/child"], 1)],
            ManagerRegistry::new(),
            SoftRedirectConfig {
                enable: true,
                status_code: 301,
            },
        )
        .await;

        let redirect = resolver.resolve("/child").await.unwrap().unwrap();
        assert_eq!(redirect.status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(redirect.location, "/child-moved");
    }

    #[tokio::test]
    async fn test_disabled_never_resolves() {
        let resolver = resolver_with(
            vec![doc("child", "default", "/child-moved", &["/child"], 1)],
            ManagerRegistry::new(),
            SoftRedirectConfig {
                enable: false,
                status_code: 302,
            },
        )
        .await;

        assert_eq!(location(&resolver, "/child").await, None);
    }

    struct BrokenStore;

    #[async_trait]
    impl DocumentStore for BrokenStore {
        async fn find_by_historic_urls(&self, _urls: &[String]) -> StoreResult<Vec<Document>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_by_urls(&self, _urls: &[String]) -> StoreResult<Vec<Document>> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn add_historic_url(&self, _id: &DocumentId, _url: &str) -> StoreResult<bool> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn ensure_index(&self, _field: IndexField) -> StoreResult<()> {
            Ok(())
        }
        async fn insert(&self, _doc: Document) -> StoreResult<()> {
            Ok(())
        }
        async fn get(&self, _id: &DocumentId) -> StoreResult<Option<Document>> {
            Ok(None)
        }
        async fn move_to(&self, id: &DocumentId, _url: &str) -> StoreResult<Document> {
            Err(StoreError::NotFound(id.clone()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let resolver = RedirectResolver::new(
            Arc::new(BrokenStore),
            Arc::new(ManagerRegistry::new()),
            SoftRedirectConfig::default(),
        );
        assert!(matches!(
            resolver.resolve("/child").await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_longest_historic_match() {
        let d = doc("d", "default", "/x", &["/child", "/child/moved", "/elsewhere"], 1);
        let prefixes = prefix_segments("/child/moved/param1");
        assert_eq!(longest_historic_match(&d, &prefixes), Some("/child/moved"));

        let none = doc("n", "default", "/x", &["/elsewhere"], 1);
        assert_eq!(longest_historic_match(&none, &prefixes), None);
    }
}
