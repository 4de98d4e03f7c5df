//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Open store → Compile document types → Build server → Run migrations
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain requests → Save store → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store, then listener
//! - Fail fast: any startup error is fatal
//! - Migrations run before the first request is accepted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
