//! Cinema Queue - ticket line with VIP priority for a single box office
//!
//! This crate provides a generic priority-insertion queue with a served
//! history, wrapped in a shared box office exposed over HTTP.

pub mod config;
pub mod error;
pub mod message;
pub mod metrics;
pub mod profile;
pub mod queue;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MessageError, QueueError, QueueResult, Result};
pub use types::*;

// Re-export key components
pub use queue::{History, PriorityQueueManager, WaitingLine};
pub use service::{AppState, BoxOffice};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
