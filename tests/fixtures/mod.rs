//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use cinema_queue::config::QueueSettings;
use cinema_queue::error::MessageError;
use cinema_queue::message::{MessageGenerator, MessageOutcome, MessageProvider, MessageSource};
use cinema_queue::metrics::MetricsCollector;
use cinema_queue::profile::ProfileGenerator;
use cinema_queue::service::BoxOffice;
use cinema_queue::types::CustomerProfile;
use cinema_queue::utils::current_timestamp;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Profile generator that hands out "Customer 1", "Customer 2", ...
#[derive(Debug, Default)]
pub struct SequentialProfileGenerator {
    counter: AtomicUsize,
}

impl SequentialProfileGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileGenerator for SequentialProfileGenerator {
    fn generate(&self) -> CustomerProfile {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        profile_named(&format!("Customer {}", n))
    }
}

pub fn profile_named(name: &str) -> CustomerProfile {
    CustomerProfile {
        name: name.to_string(),
        avatar: "🐼".to_string(),
        snack: "🍿 Popcorn".to_string(),
        joined_at: current_timestamp(),
    }
}

/// Generator that answers with a fixed greeting
#[derive(Debug, Default)]
pub struct GreetingGenerator;

#[async_trait]
impl MessageGenerator for GreetingGenerator {
    async fn generate(&self, profile: &CustomerProfile) -> Result<String, MessageError> {
        Ok(format!("Welcome to the premiere, {}!", profile.name))
    }
}

/// Generator that always errors
#[derive(Debug, Default)]
pub struct FailingGenerator;

#[async_trait]
impl MessageGenerator for FailingGenerator {
    async fn generate(&self, _profile: &CustomerProfile) -> Result<String, MessageError> {
        Err(MessageError::Failed {
            reason: "upstream returned 503".to_string(),
        })
    }
}

/// Generator that takes longer than any reasonable timeout
#[derive(Debug)]
pub struct SlowGenerator {
    pub delay: Duration,
}

#[async_trait]
impl MessageGenerator for SlowGenerator {
    async fn generate(&self, profile: &CustomerProfile) -> Result<String, MessageError> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("Sorry for the wait, {}", profile.name))
    }
}

/// Provider that records which customers it was asked about
#[derive(Debug, Default)]
pub struct RecordingMessageProvider {
    requested: Mutex<Vec<String>>,
}

impl RecordingMessageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageProvider for RecordingMessageProvider {
    async fn message_for(&self, profile: &CustomerProfile) -> MessageOutcome {
        if let Ok(mut names) = self.requested.lock() {
            names.push(profile.name.clone());
        }
        MessageOutcome {
            text: format!("Enjoy, {}", profile.name),
            source: MessageSource::Generated,
        }
    }
}

/// Box office with predictable profile names and no messages
pub fn create_test_office() -> BoxOffice {
    let metrics = Arc::new(MetricsCollector::new().expect("Failed to create metrics collector"));
    BoxOffice::new(QueueSettings::default(), metrics)
        .with_profiles(Arc::new(SequentialProfileGenerator::new()))
}
