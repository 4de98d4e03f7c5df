//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, request span)
//!     → PageRouter::dispatch
//!         found:     response.rs render → page_before_send (history) → send
//!         not found: page_not_found → response.rs redirect, or plain 404
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
