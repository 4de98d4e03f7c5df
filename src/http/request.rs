//! Request identification.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID when the client sent none
//! - Echo it back on the response
//! - Open a tracing span per request carrying the ID
//!
//! # Design Decisions
//! - Request ID added as early as possible (outermost layer) for tracing

use axum::body::Body;
use axum::http::{HeaderMap, Request};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

/// The request ID header, or "unknown".
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Span factory for `TraceLayer`.
pub fn make_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id(req.headers()),
    )
}
