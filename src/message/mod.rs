//! Decorative messages for served customers
//!
//! A served ticket may carry a short flavour line. Generators are fallible
//! collaborators; the provider bounds them with a timeout and always falls
//! back to a local line, so serving never depends on them.

pub mod generator;
pub mod provider;

pub use generator::{FallbackMessageGenerator, MessageGenerator, FALLBACK_MESSAGES};
pub use provider::{MessageOutcome, MessageProvider, MessageSource, ResilientMessageProvider};
