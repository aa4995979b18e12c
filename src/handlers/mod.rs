//! HTTP API handlers, organized by domain.

pub mod router;
pub mod state;
pub mod types;

pub mod context;
pub mod conversations;
pub mod entity;
pub mod health;
pub mod memory;

pub use router::build_router;
pub use state::{AppState, MemoryEngine};
pub use types::*;
