//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the page handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Dispatch requests to pages, record history before sending
//! - Turn not-found requests into soft redirects when history allows it

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::docs::{DocumentStore, ManagerRegistry, MemoryStore, StoreResult};
use crate::http::request::{make_span, request_id};
use crate::http::response;
use crate::lifecycle::shutdown;
use crate::redirects::SoftRedirects;
use crate::routing::PageRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pages: PageRouter,
    pub soft_redirects: SoftRedirects,
}

/// HTTP server for the site.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    /// Saved on shutdown, when the store is file-backed.
    persisted: Option<MemoryStore>,
    soft_redirects: SoftRedirects,
}

impl HttpServer {
    /// Create a new HTTP server over `store` with the given document types.
    pub fn new(config: AppConfig, store: MemoryStore, managers: ManagerRegistry) -> Self {
        let mut server = Self::with_store(config, Arc::new(store.clone()), managers);
        server.persisted = Some(store);
        server
    }

    /// Create a server over any document store. Nothing is saved on shutdown.
    pub fn with_store(
        config: AppConfig,
        shared: Arc<dyn DocumentStore>,
        managers: ManagerRegistry,
    ) -> Self {
        let managers = Arc::new(managers);

        let soft_redirects = SoftRedirects::new(
            shared.clone(),
            managers.clone(),
            config.soft_redirects.clone(),
        );
        let state = AppState {
            pages: PageRouter::new(shared, managers),
            soft_redirects: soft_redirects.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            persisted: None,
            soft_redirects,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .fallback(page_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Startup migrations. Must run before traffic is accepted.
    pub async fn migrate(&self) -> StoreResult<()> {
        self.soft_redirects.ensure_indexes().await?;
        tracing::info!(
            soft_redirects = self.soft_redirects.is_enabled(),
            "Migrations complete"
        );
        Ok(())
    }

    /// The router, for driving the service without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `stop` fires, then persist the store.
    pub async fn run(
        self,
        listener: TcpListener,
        stop: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(stop))
            .await?;

        if let Some(store) = &self.persisted {
            if let Err(e) = store.save_to_file() {
                tracing::error!(error = %e, "Failed to save documents");
            }
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Serves pages; falls back to soft redirects, then 404.
async fn page_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let request_id = request_id(&headers);
    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());

    match state.pages.dispatch(target).await {
        Ok(Some(dispatched)) => {
            let rendered = response::render(&dispatched);
            // History failures never cost the visitor the page.
            if let Err(e) = state.soft_redirects.page_before_send(&dispatched).await {
                tracing::warn!(request_id = %request_id, path = %uri.path(), error = %e, "Failed to record historic url");
            }
            rendered
        }
        Ok(None) => page_not_found(&state, target, &request_id).await,
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %uri.path(), error = %e, "Page lookup failed");
            response::internal_error()
        }
    }
}

async fn page_not_found(state: &AppState, target: &str, request_id: &str) -> Response {
    match state.soft_redirects.page_not_found(target).await {
        Ok(Some(redirect)) => {
            tracing::debug!(
                request_id = %request_id,
                location = %redirect.location,
                status = redirect.status.as_u16(),
                "Redirecting to current url"
            );
            response::redirect(redirect)
        }
        Ok(None) => response::not_found(),
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Soft redirect lookup failed, serving 404");
            response::not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs::{DocKind, DocManager, Document, DocumentId, IndexField, StoreError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    async fn send(router: &Router, method: Method, path: &str) -> Response {
        router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_serve_move_redirect() {
        let store = MemoryStore::new(None);
        store
            .insert(Document::new("default", "Child", Some("/child")).with_id("child"))
            .await
            .unwrap();
        let server = HttpServer::new(AppConfig::default(), store.clone(), ManagerRegistry::new());
        server.migrate().await.unwrap();
        let router = server.router();

        let res = send(&router, Method::GET, "/child").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));

        store
            .move_to(&DocumentId::from("child"), "/child-moved")
            .await
            .unwrap();

        let res = send(&router, Method::GET, "/child").await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/child-moved");

        let res = send(&router, Method::GET, "/never-existed").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_params_are_rendered() {
        let store = MemoryStore::new(None);
        store
            .insert(Document::new("custom-page", "Deep", Some("/deep")).with_id("deep"))
            .await
            .unwrap();
        let mut managers = ManagerRegistry::new();
        managers.register(
            "custom-page",
            DocManager::from_patterns(DocKind::Page, &["/", "/:param1"]).unwrap(),
        );
        let router = HttpServer::new(AppConfig::default(), store, managers).router();

        let res = send(&router, Method::GET, "/deep/value").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["params"]["param1"], "value");
        assert_eq!(json["page"]["title"], "Deep");
    }

    #[tokio::test]
    async fn test_post_not_allowed() {
        let router = HttpServer::new(AppConfig::default(), MemoryStore::new(None), ManagerRegistry::new())
            .router();
        let res = send(&router, Method::POST, "/anything").await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    /// Serves `/child` but fails the selected history operations.
    struct FailingHistoryStore {
        fail_find: bool,
        fail_add: bool,
    }

    #[async_trait]
    impl DocumentStore for FailingHistoryStore {
        async fn find_by_historic_urls(&self, _urls: &[String]) -> StoreResult<Vec<Document>> {
            if self.fail_find {
                return Err(StoreError::Unavailable("history down".into()));
            }
            Ok(Vec::new())
        }
        async fn find_by_urls(&self, urls: &[String]) -> StoreResult<Vec<Document>> {
            let child = Document::new("default", "Child", Some("/child")).with_id("child");
            Ok(urls
                .iter()
                .filter(|u| u.as_str() == "/child")
                .map(|_| child.clone())
                .collect())
        }
        async fn add_historic_url(&self, _id: &DocumentId, _url: &str) -> StoreResult<bool> {
            if self.fail_add {
                return Err(StoreError::Unavailable("history down".into()));
            }
            Ok(true)
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

    fn failing_router(fail_find: bool, fail_add: bool) -> Router {
        let store = FailingHistoryStore {
            fail_find,
            fail_add,
        };
        HttpServer::with_store(AppConfig::default(), Arc::new(store), ManagerRegistry::new())
            .router()
    }

    #[tokio::test]
    async fn test_history_write_failure_still_serves_page() {
        let router = failing_router(false, true);
        let res = send(&router, Method::GET, "/child").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["page"]["title"], "Child");
    }

    #[tokio::test]
    async fn test_history_lookup_failure_is_plain_not_found() {
        let router = failing_router(true, false);
        let res = send(&router, Method::GET, "/moved-away").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().get(header::LOCATION).is_none());

        let res = send(&router, Method::GET, "/child").await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
