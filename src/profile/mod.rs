//! Customer display data
//!
//! Generates the presentation fields attached to each ticket. The queue core
//! treats them as opaque.

pub mod generator;

pub use generator::{ProfileGenerator, RandomProfileGenerator, AVATARS, NAMES, SNACKS};
