//! Profile generator interface and the random implementation

use crate::types::CustomerProfile;
use crate::utils::current_timestamp;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Mutex, PoisonError};

pub const NAMES: &[&str] = &[
    "Kai", "Luna", "Milo", "Nova", "Leo", "Mia", "Zane", "Cleo", "Jax", "Ivy", "Finn", "Ruby",
];

pub const AVATARS: &[&str] = &[
    "🐼", "🦊", "🦄", "🦁", "🐯", "🐸", "🐙", "🐵", "🐨", "🐷", "🐻", "🐲",
];

pub const SNACKS: &[&str] = &[
    "🍿 Popcorn",
    "🥤 Soda",
    "🌭 Hot Dog",
    "🍫 Chocolate",
    "🧃 Juice",
    "🍬 Candy",
    "🥨 Pretzel",
    "🧁 Cupcake",
];

/// Trait for producing the display fields of a new ticket
pub trait ProfileGenerator: Send + Sync {
    /// Build a profile for a customer joining now
    fn generate(&self) -> CustomerProfile;
}

/// Picks name, avatar and snack uniformly from fixed lists
#[derive(Debug)]
pub struct RandomProfileGenerator {
    rng: Mutex<StdRng>,
}

impl RandomProfileGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for simulations and tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomProfileGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or("Guest")
}

impl ProfileGenerator for RandomProfileGenerator {
    fn generate(&self) -> CustomerProfile {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        CustomerProfile {
            name: pick(&mut rng, NAMES).to_string(),
            avatar: pick(&mut rng, AVATARS).to_string(),
            snack: pick(&mut rng, SNACKS).to_string(),
            joined_at: current_timestamp(),
        }
    }
}
