//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use soft_redirects::config::AppConfig;
use soft_redirects::docs::MemoryStore;
use soft_redirects::lifecycle::startup::build_server;
use soft_redirects::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A running site bound to an ephemeral local port.
pub struct TestSite {
    pub addr: SocketAddr,
    pub store: MemoryStore,
    shutdown: Shutdown,
}

impl TestSite {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestSite {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the server over `store` and wait until it accepts connections.
pub async fn start_site(config: AppConfig, store: MemoryStore) -> TestSite {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = build_server(config, store.clone()).await.unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestSite {
        addr,
        store,
        shutdown,
    }
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
