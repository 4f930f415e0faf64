//! Cinema line management
//!
//! This module contains the queue core: the waiting line with VIP insertion,
//! the served history, and the manager that ties them to the ticket counter.

pub mod history;
pub mod line;
pub mod manager;

// Re-export commonly used types
pub use history::{History, HistorySnapshot};
pub use line::WaitingLine;
pub use manager::{PriorityQueueManager, QueueManagerStats};
