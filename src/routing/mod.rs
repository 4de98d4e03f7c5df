//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ancestor paths → documents owning them)
//!     → matcher.rs (evaluate the type's dispatch rules on the remainder)
//!     → Return: Dispatched { page, piece, params } or NoMatch
//!
//! Rule compilation (at startup):
//!     [[types]] dispatch patterns
//!     → RoutePattern::parse
//!     → frozen inside ManagerRegistry
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input and store contents always dispatch the same way

pub mod matcher;
pub mod router;

pub use router::{Dispatched, PageRouter};
