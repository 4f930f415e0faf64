//! Message generator interface and the local fallback implementation

use crate::error::MessageError;
use crate::types::CustomerProfile;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Mutex, PoisonError};

#[cfg(test)]
use mockall::automock;

/// Templates used when no generator is reachable. `{name}` and `{snack}` are
/// filled from the customer profile.
pub const FALLBACK_MESSAGES: &[&str] = &[
    "Enjoy the show, {name}! 🎬",
    "{name}, your seat awaits! 🍿",
    "Lights down, {name}. Showtime! ✨",
    "Grab your {snack} and settle in, {name}!",
    "Popcorn ready? Have a great movie, {name}! 🎥",
    "The big screen is calling, {name}! 🌟",
];

/// Trait for producing a decorative line for a served customer
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    /// Produce a short message for the given customer
    async fn generate(&self, profile: &CustomerProfile) -> Result<String, MessageError>;
}

/// Local generator that never fails
#[derive(Debug)]
pub struct FallbackMessageGenerator {
    rng: Mutex<StdRng>,
}

impl FallbackMessageGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick and fill a fallback template
    pub fn message_for(&self, profile: &CustomerProfile) -> String {
        let template = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            FALLBACK_MESSAGES
                .choose(&mut *rng)
                .copied()
                .unwrap_or("Enjoy the show, {name}!")
        };

        template
            .replace("{name}", &profile.name)
            .replace("{snack}", &profile.snack)
    }
}

impl Default for FallbackMessageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageGenerator for FallbackMessageGenerator {
    async fn generate(&self, profile: &CustomerProfile) -> Result<String, MessageError> {
        Ok(self.message_for(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            name: "Luna".to_string(),
            avatar: "🦊".to_string(),
            snack: "🍿 Popcorn".to_string(),
            joined_at: current_timestamp(),
        }
    }

    #[test]
    fn test_fallback_fills_placeholders() {
        let generator = FallbackMessageGenerator::with_seed(7);
        for _ in 0..20 {
            let message = generator.message_for(&profile());
            assert!(message.contains("Luna"));
            assert!(!message.contains('{'));
        }
    }

    #[tokio::test]
    async fn test_fallback_generator_never_fails() {
        let generator = FallbackMessageGenerator::new();
        let message = generator.generate(&profile()).await.unwrap();
        assert!(!message.is_empty());
    }
}
