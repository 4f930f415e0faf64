//! Message provider interface and implementations
//!
//! The provider combines an optional primary generator with the local
//! fallback. A primary failure, timeout or absence is logged and replaced by
//! a fallback line; callers always receive a message.

use crate::error::MessageError;
use crate::message::generator::{FallbackMessageGenerator, MessageGenerator};
use crate::types::CustomerProfile;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Where a delivered message came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    Generated,
    Fallback(MessageError),
}

impl MessageSource {
    /// Label used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSource::Generated => "generated",
            MessageSource::Fallback(_) => "fallback",
        }
    }
}

/// Message chosen for a served customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    pub text: String,
    pub source: MessageSource,
}

/// Trait for obtaining a decorative message that is always available
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Get a message for the customer being served
    async fn message_for(&self, profile: &CustomerProfile) -> MessageOutcome;
}

/// Primary generator bounded by a timeout, backed by local fallback lines
pub struct ResilientMessageProvider {
    primary: Option<Arc<dyn MessageGenerator>>,
    fallback: FallbackMessageGenerator,
    timeout: Duration,
}

impl ResilientMessageProvider {
    /// Create a provider that tries `primary` first
    pub fn new(primary: Arc<dyn MessageGenerator>, timeout: Duration) -> Self {
        Self {
            primary: Some(primary),
            fallback: FallbackMessageGenerator::new(),
            timeout,
        }
    }

    /// Create a provider with no primary generator configured
    pub fn fallback_only() -> Self {
        Self {
            primary: None,
            fallback: FallbackMessageGenerator::new(),
            timeout: Duration::ZERO,
        }
    }

    /// Replace the fallback generator (e.g. with a seeded one)
    pub fn with_fallback(mut self, fallback: FallbackMessageGenerator) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_primary(&self, profile: &CustomerProfile) -> Result<String, MessageError> {
        let primary = self.primary.as_ref().ok_or(MessageError::Unavailable)?;

        match tokio::time::timeout(self.timeout, primary.generate(profile)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => Err(MessageError::Failed {
                reason: "generator returned an empty message".to_string(),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(MessageError::TimedOut {
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

impl Default for ResilientMessageProvider {
    fn default() -> Self {
        Self::fallback_only()
    }
}

#[async_trait]
impl MessageProvider for ResilientMessageProvider {
    async fn message_for(&self, profile: &CustomerProfile) -> MessageOutcome {
        match self.try_primary(profile).await {
            Ok(text) => {
                debug!("Generated message for '{}'", profile.name);
                MessageOutcome {
                    text,
                    source: MessageSource::Generated,
                }
            }
            Err(e) => {
                if e == MessageError::Unavailable {
                    debug!("No message generator configured, using fallback");
                } else {
                    warn!("Message generation for '{}' fell back: {}", profile.name, e);
                }
                MessageOutcome {
                    text: self.fallback.message_for(profile),
                    source: MessageSource::Fallback(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::generator::MockMessageGenerator;
    use crate::utils::current_timestamp;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            name: "Milo".to_string(),
            avatar: "🐼".to_string(),
            snack: "🥤 Soda".to_string(),
            joined_at: current_timestamp(),
        }
    }

    #[tokio::test]
    async fn test_primary_message_used() {
        let mut mock = MockMessageGenerator::new();
        mock.expect_generate()
            .withf(|p| p.name == "Milo")
            .times(1)
            .returning(|_| Ok("Here's looking at you, Milo.".to_string()));

        let provider = ResilientMessageProvider::new(Arc::new(mock), Duration::from_millis(200));
        let outcome = provider.message_for(&profile()).await;

        assert_eq!(outcome.source, MessageSource::Generated);
        assert_eq!(outcome.text, "Here's looking at you, Milo.");
    }

    #[tokio::test]
    async fn test_primary_failure_falls_back() {
        let mut mock = MockMessageGenerator::new();
        mock.expect_generate().returning(|_| {
            Err(MessageError::Failed {
                reason: "quota exceeded".to_string(),
            })
        });

        let provider = ResilientMessageProvider::new(Arc::new(mock), Duration::from_millis(200));
        let outcome = provider.message_for(&profile()).await;

        assert!(matches!(
            outcome.source,
            MessageSource::Fallback(MessageError::Failed { .. })
        ));
        assert!(outcome.text.contains("Milo"));
    }

    #[tokio::test]
    async fn test_empty_primary_message_falls_back() {
        let mut mock = MockMessageGenerator::new();
        mock.expect_generate().returning(|_| Ok("   ".to_string()));

        let provider = ResilientMessageProvider::new(Arc::new(mock), Duration::from_millis(200));
        let outcome = provider.message_for(&profile()).await;

        assert_eq!(outcome.source.as_str(), "fallback");
        assert!(!outcome.text.trim().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_only_reports_unavailable() {
        let provider = ResilientMessageProvider::fallback_only();
        assert!(!provider.has_primary());

        let outcome = provider.message_for(&profile()).await;
        assert_eq!(outcome.source, MessageSource::Fallback(MessageError::Unavailable));
    }

    struct StalledGenerator;

    #[async_trait]
    impl MessageGenerator for StalledGenerator {
        async fn generate(&self, _profile: &CustomerProfile) -> Result<String, MessageError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_slow_primary_times_out() {
        let provider =
            ResilientMessageProvider::new(Arc::new(StalledGenerator), Duration::from_millis(50));
        let outcome = provider.message_for(&profile()).await;

        assert_eq!(
            outcome.source,
            MessageSource::Fallback(MessageError::TimedOut { after_ms: 50 })
        );
    }
}
