//! Soft redirects for a document-driven site.
//!
//! When a request is about to 404, look for a document that answered to that
//! address in the past and redirect to where it lives now. History is kept by
//! recording each document's address whenever it is served.

pub mod config;
pub mod docs;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod redirects;
pub mod routing;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use redirects::{Redirect, SoftRedirects};
