//! Document storage subsystem.
//!
//! # Data Flow
//! ```text
//! Page dispatch / soft redirects
//!     → store.rs (DocumentStore trait: queries, set-inserts, indexes)
//!     → memory.rs (DashMap-backed implementation, JSON persistence)
//!
//! Type lookups:
//!     document.type → managers.rs (ManagerRegistry) → DocManager { kind, rules }
//! ```
//!
//! # Design Decisions
//! - Store is a trait object so the core never depends on a backend
//! - History writes are set-inserts; the store is the only concurrency control
//! - Unknown document types behave as pages without dispatch rules

pub mod managers;
pub mod memory;
pub mod model;
pub mod store;

pub use managers::{DocManager, ManagerRegistry};
pub use memory::MemoryStore;
pub use model::{DocKind, Document, DocumentId};
pub use store::{DocumentStore, IndexField, StoreError, StoreResult};
