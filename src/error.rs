//! Error types for the cinema queue service
//!
//! Application edges use anyhow for propagation; the queue core and its
//! collaborators expose typed errors through thiserror.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Result type for queue core operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Errors raised by the queue core and the session layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Serve was requested while nobody is waiting. Expected and recoverable.
    #[error("queue is empty")]
    EmptyQueue,

    #[error("History snapshot failed: {message}")]
    PersistenceFailed { message: String },
}

/// Failures of a decorative-message generator.
///
/// These never reach callers of `serve_next`; the message provider swaps in
/// a fallback string whenever one is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("message generator unavailable")]
    Unavailable,

    #[error("message generation failed: {reason}")]
    Failed { reason: String },

    #[error("message generation timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },
}
