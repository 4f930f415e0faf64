//! Integration tests for the cinema-queue service
//!
//! These tests drive the box office and the application state the way the
//! HTTP layer does, including:
//! - The documented join/serve walkthrough
//! - Message generation with fallback on failure and timeout
//! - Session reset and history snapshots
//! - The running HTTP server

mod fixtures;

use cinema_queue::config::AppConfig;
use cinema_queue::queue::HistorySnapshot;
use cinema_queue::service::AppState;
use cinema_queue::types::CustomerProfile;
use cinema_queue::QueueError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use fixtures::{
    create_test_office, FailingGenerator, GreetingGenerator, RecordingMessageProvider,
    SlowGenerator,
};

fn waiting_ids(view: &cinema_queue::service::QueueView) -> Vec<u64> {
    view.waiting.iter().map(|t| t.id).collect()
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.service.host = "127.0.0.1".to_string();
    config.service.http_port = 0;
    config.service.shutdown_timeout_seconds = 1;
    config
}

#[tokio::test]
async fn test_walkthrough_scenario() {
    let office = create_test_office();

    // Step 1-2: two regular customers
    assert_eq!(office.join(false).await.id, 101);
    assert_eq!(office.join(false).await.id, 102);
    assert_eq!(waiting_ids(&office.view().await), vec![101, 102]);

    // Step 3: first VIP goes to the very front
    assert_eq!(office.join(true).await.id, 103);
    assert_eq!(waiting_ids(&office.view().await), vec![103, 101, 102]);

    // Step 4: second VIP goes behind the first
    assert_eq!(office.join(true).await.id, 104);
    assert_eq!(waiting_ids(&office.view().await), vec![103, 104, 101, 102]);

    // Step 5: serve the front
    let outcome = office.serve_next().await.unwrap();
    assert_eq!(outcome.ticket.id, 103);
    assert_eq!(outcome.ticket.display.name, "Customer 3");
    assert_eq!(waiting_ids(&office.view().await), vec![104, 101, 102]);
    let history: Vec<_> = office.history(None).await.iter().map(|t| t.id).collect();
    assert_eq!(history, vec![103]);

    // Step 6: drain, then one more serve fails without changing anything
    for expected in [104, 101, 102] {
        assert_eq!(office.serve_next().await.unwrap().ticket.id, expected);
    }
    let before = office.view().await;
    assert_eq!(office.serve_next().await.unwrap_err(), QueueError::EmptyQueue);
    let after = office.view().await;
    assert!(after.waiting.is_empty());
    assert_eq!(after.next_id, before.next_id);

    let history: Vec<_> = office.history(None).await.iter().map(|t| t.id).collect();
    assert_eq!(history, vec![102, 101, 104, 103]);
}

#[tokio::test]
async fn test_vip_behind_served_vip_run() {
    let office = create_test_office();
    office.join(true).await; // 101
    office.join(false).await; // 102
    office.serve_next().await.unwrap(); // 101 leaves, line is [102]

    office.join(true).await; // 103 goes ahead of 102
    office.join(true).await; // 104 behind 103
    office.join(false).await; // 105 at the back

    assert_eq!(waiting_ids(&office.view().await), vec![103, 104, 102, 105]);
    assert_eq!(office.position_of(102).await, Some(2));
    assert_eq!(office.position_of(101).await, None);
}

#[tokio::test]
async fn test_generated_message_attached() {
    let state = AppState::with_message_generator(test_config(), Arc::new(GreetingGenerator))
        .expect("Failed to create app state");
    let office = state.box_office();

    let ticket = office.join(false).await;
    let outcome = office.serve_next().await.unwrap();

    assert_eq!(outcome.message_source.as_deref(), Some("generated"));
    assert_eq!(
        outcome.ticket.served.unwrap().message,
        Some(format!("Welcome to the premiere, {}!", ticket.display.name))
    );
}

#[tokio::test]
async fn test_failing_generator_falls_back() {
    let state = AppState::with_message_generator(test_config(), Arc::new(FailingGenerator))
        .expect("Failed to create app state");
    let office = state.box_office();

    office.join(true).await;
    let outcome = office.serve_next().await.unwrap();

    assert_eq!(outcome.message_source.as_deref(), Some("fallback"));
    let message = outcome.ticket.served.unwrap().message.unwrap();
    assert!(!message.trim().is_empty());
}

#[tokio::test]
async fn test_slow_generator_times_out() {
    let mut config = test_config();
    config.messages.timeout_ms = 50;
    let generator = Arc::new(SlowGenerator {
        delay: Duration::from_secs(30),
    });
    let state = AppState::with_message_generator(config, generator).unwrap();
    let office = state.box_office();

    office.join(false).await;
    let started = Instant::now();
    let outcome = office.serve_next().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(outcome.message_source.as_deref(), Some("fallback"));
    assert!(outcome.ticket.is_served());
}

#[tokio::test]
async fn test_messages_disabled() {
    let mut config = test_config();
    config.messages.enabled = false;
    let state = AppState::with_message_generator(config, Arc::new(GreetingGenerator)).unwrap();
    let office = state.box_office();

    office.join(false).await;
    let outcome = office.serve_next().await.unwrap();
    assert!(outcome.message_source.is_none());
    assert!(outcome.ticket.served.unwrap().message.is_none());
}

#[tokio::test]
async fn test_message_requested_for_served_customer_only() {
    let provider = Arc::new(RecordingMessageProvider::new());
    let office = create_test_office().with_messages(provider.clone());

    office.join(false).await; // Customer 1
    office.join(true).await; // Customer 2, served first
    office.serve_next().await.unwrap();

    // Empty serves never reach the provider
    office.serve_next().await.unwrap();
    office.serve_next().await.unwrap_err();

    assert_eq!(provider.requested(), vec!["Customer 2", "Customer 1"]);
}

#[tokio::test]
async fn test_reset_mid_session() {
    let office = create_test_office();
    for vip in [false, true, false] {
        office.join(vip).await;
    }
    office.serve_next().await.unwrap();
    let old_session = office.stats().await.session_id;

    let new_session = office.reset().await;
    assert_ne!(old_session, new_session);

    let view = office.view().await;
    assert!(view.waiting.is_empty());
    assert_eq!(view.next_id, 101);
    assert!(office.history(None).await.is_empty());
    assert_eq!(office.stats().await.queue.tickets_issued, 0);

    assert_eq!(office.join(true).await.id, 101);
}

#[tokio::test]
async fn test_history_snapshot_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("served.json");
    let mut config = test_config();
    config.messages.enabled = false;
    config.persistence.history_snapshot_path = Some(path.clone());

    let state = AppState::new(config).unwrap();
    let office = state.box_office();
    office.join(false).await;
    office.join(true).await;
    office.serve_next().await.unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let snapshot: HistorySnapshot<CustomerProfile> = serde_json::from_str(&contents).unwrap();
    assert_eq!(snapshot.session_id, office.stats().await.session_id);
    assert_eq!(snapshot.served.len(), 1);
    assert_eq!(snapshot.served[0].id, 102);
    assert!(snapshot.served[0].is_priority);
}

async fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_running_service_answers_probes() {
    let state = Arc::new(AppState::new(test_config()).unwrap());
    let addr = state.start().await.unwrap();

    state.box_office().join(true).await;

    let alive = http_get(addr, "/alive").await;
    assert!(alive.starts_with("HTTP/1.1 200"), "{}", alive);
    assert!(alive.contains("Alive"));

    let ready = http_get(addr, "/ready").await;
    assert!(ready.starts_with("HTTP/1.1 200"), "{}", ready);

    let queue = http_get(addr, "/queue").await;
    assert!(queue.contains("\"waiting_count\":1"), "{}", queue);

    state.shutdown().await.unwrap();
    assert!(!state.is_running().await);
}
