//! Box office session
//!
//! Wraps one `PriorityQueueManager` behind a single async mutex so several
//! HTTP sessions can share a line. Every operation takes the lock for its
//! whole duration, including the bounded message lookup during a serve.

use crate::config::{AppConfig, QueueSettings};
use crate::error::{QueueError, QueueResult};
use crate::message::{MessageProvider, ResilientMessageProvider};
use crate::metrics::MetricsCollector;
use crate::profile::{ProfileGenerator, RandomProfileGenerator};
use crate::queue::{HistorySnapshot, PriorityQueueManager, QueueManagerStats};
use crate::types::{CustomerProfile, EntryId, Ticket};
use crate::utils::{current_timestamp, generate_session_id, is_milestone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of serving the next customer
#[derive(Debug, Clone, Serialize)]
pub struct ServeOutcome {
    pub ticket: Ticket,
    /// Number of customers served this session, including this one
    pub served_count: usize,
    /// This customer hit a celebration milestone
    pub celebrate: bool,
    /// "generated" or "fallback"; absent when messages are disabled
    pub message_source: Option<String>,
}

/// Read-only view of the line for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueView {
    pub session_id: Uuid,
    pub now_serving: Option<Ticket>,
    pub waiting: Vec<Ticket>,
    pub waiting_count: usize,
    pub vip_count: usize,
    pub next_id: EntryId,
}

/// Session statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxOfficeStats {
    pub session_id: Uuid,
    pub session_started_at: DateTime<Utc>,
    /// Serve attempts against an empty line this session
    pub empty_serves: u64,
    pub queue: QueueManagerStats,
}

struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    manager: PriorityQueueManager<CustomerProfile>,
    empty_serves: u64,
}

impl Session {
    fn new(base_id: EntryId) -> Self {
        Self {
            id: generate_session_id(),
            started_at: current_timestamp(),
            manager: PriorityQueueManager::new(base_id),
            empty_serves: 0,
        }
    }
}

/// Shared cinema line with its collaborators
pub struct BoxOffice {
    session: Mutex<Session>,
    settings: QueueSettings,
    profiles: Arc<dyn ProfileGenerator>,
    messages: Option<Arc<dyn MessageProvider>>,
    metrics: Arc<MetricsCollector>,
    snapshot_path: Option<PathBuf>,
}

impl BoxOffice {
    /// Create a box office with random profiles and no messages
    pub fn new(settings: QueueSettings, metrics: Arc<MetricsCollector>) -> Self {
        let session = Session::new(settings.ticket_id_base);
        info!(
            "Opening box office session {} (tickets from #{})",
            session.id, settings.ticket_id_base
        );

        Self {
            session: Mutex::new(session),
            settings,
            profiles: Arc::new(RandomProfileGenerator::new()),
            messages: None,
            metrics,
            snapshot_path: None,
        }
    }

    /// Build a box office from application config
    pub fn from_config(config: &AppConfig, metrics: Arc<MetricsCollector>) -> Self {
        let mut office = Self::new(config.queue.clone(), metrics);
        if config.messages.enabled {
            office = office.with_messages(Arc::new(ResilientMessageProvider::fallback_only()));
        }
        if let Some(path) = &config.persistence.history_snapshot_path {
            office = office.with_snapshot_path(path.clone());
        }
        office
    }

    pub fn with_profiles(mut self, profiles: Arc<dyn ProfileGenerator>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_messages(mut self, messages: Arc<dyn MessageProvider>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// A new customer joins with a generated profile
    pub async fn join(&self, is_priority: bool) -> Ticket {
        let profile = self.profiles.generate();
        self.join_with_profile(profile, is_priority).await
    }

    /// A new customer joins with the given profile
    pub async fn join_with_profile(&self, profile: CustomerProfile, is_priority: bool) -> Ticket {
        let timer = self.metrics.start_timer();
        let mut session = self.session.lock().await;

        let ticket = session.manager.add(profile, is_priority);
        let position = session.manager.position_of(ticket.id).unwrap_or_default();

        info!(
            "{} {} joined as #{} ({}), position {} of {}",
            ticket.display.avatar,
            ticket.display.name,
            ticket.id,
            ticket.class(),
            position + 1,
            session.manager.len()
        );

        self.metrics.record_ticket_issued(ticket.class());
        self.metrics
            .update_from_queue_stats(&session.manager.stats());
        self.metrics.record_operation("join", timer.stop());

        ticket
    }

    /// Serve the customer at the front of the line.
    ///
    /// Returns `EmptyQueue` when nobody is waiting; nothing changes then.
    pub async fn serve_next(&self) -> QueueResult<ServeOutcome> {
        let timer = self.metrics.start_timer();
        let mut session = self.session.lock().await;

        let Some(front) = session.manager.peek_next().map(|t| t.display.clone()) else {
            session.empty_serves += 1;
            self.metrics.record_empty_serve();
            info!("Serve requested but the queue is empty");
            return Err(QueueError::EmptyQueue);
        };

        let (message, message_source) = match &self.messages {
            Some(provider) => {
                let outcome = provider.message_for(&front).await;
                let source = outcome.source.as_str();
                self.metrics.record_message(source);
                (Some(outcome.text), Some(source.to_string()))
            }
            None => (None, None),
        };

        let ticket = session.manager.serve_next_with_message(message)?;
        let served_count = session.manager.history().len();
        let celebrate = is_milestone(served_count, self.settings.celebration_interval);

        info!(
            "Now serving #{} {} ({}), {} still waiting",
            ticket.id,
            ticket.display.name,
            ticket.class(),
            session.manager.len()
        );
        if celebrate {
            info!("🎉 {} customers served this session", served_count);
            self.metrics.record_celebration();
        }

        self.metrics.record_ticket_served(ticket.class());
        self.metrics
            .update_from_queue_stats(&session.manager.stats());

        if let Some(path) = &self.snapshot_path {
            let snapshot = HistorySnapshot::capture(session.id, session.manager.history());
            if let Err(e) = write_snapshot(path, &snapshot).await {
                warn!("Failed to write history snapshot: {}", e);
                self.metrics.record_snapshot_failure();
            }
        }

        self.metrics.record_operation("serve", timer.stop());

        Ok(ServeOutcome {
            ticket,
            served_count,
            celebrate,
            message_source,
        })
    }

    /// The customer who would be served next
    pub async fn peek_next(&self) -> Option<Ticket> {
        let session = self.session.lock().await;
        let next = session.manager.peek_next().cloned();
        debug!("Peek: next is {:?}", next.as_ref().map(|t| t.id));
        next
    }

    /// Clear the line and history and start a new session
    pub async fn reset(&self) -> Uuid {
        let mut session = self.session.lock().await;
        session.manager.reset();
        session.empty_serves = 0;
        session.id = generate_session_id();
        session.started_at = current_timestamp();

        info!("Box office reset, new session {}", session.id);
        self.metrics.record_reset();
        self.metrics
            .update_from_queue_stats(&session.manager.stats());

        session.id
    }

    /// Current line for display
    pub async fn view(&self) -> QueueView {
        let session = self.session.lock().await;
        let waiting: Vec<Ticket> = session.manager.waiting().iter().cloned().collect();

        QueueView {
            session_id: session.id,
            now_serving: waiting.first().cloned(),
            waiting_count: waiting.len(),
            vip_count: session.manager.priority_count(),
            next_id: session.manager.next_id(),
            waiting,
        }
    }

    /// Most recently served customers, newest first
    pub async fn history(&self, limit: Option<usize>) -> Vec<Ticket> {
        let limit = limit.unwrap_or(self.settings.history_display_limit);
        let session = self.session.lock().await;
        session
            .manager
            .recent_history(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Zero-based place in line of a waiting ticket
    pub async fn position_of(&self, id: EntryId) -> Option<usize> {
        self.session.lock().await.manager.position_of(id)
    }

    pub async fn stats(&self) -> BoxOfficeStats {
        let session = self.session.lock().await;
        Self::stats_of(&session)
    }

    /// Stats without waiting for the lock; `None` while an operation runs
    pub fn try_stats(&self) -> Option<BoxOfficeStats> {
        self.session
            .try_lock()
            .ok()
            .map(|session| Self::stats_of(&session))
    }

    fn stats_of(session: &Session) -> BoxOfficeStats {
        BoxOfficeStats {
            session_id: session.id,
            session_started_at: session.started_at,
            empty_serves: session.empty_serves,
            queue: session.manager.stats(),
        }
    }
}

async fn write_snapshot(path: &Path, snapshot: &HistorySnapshot<CustomerProfile>) -> QueueResult<()> {
    let json = snapshot
        .to_json()
        .map_err(|e| QueueError::PersistenceFailed {
            message: e.to_string(),
        })?;

    tokio::fs::write(path, json)
        .await
        .map_err(|e| QueueError::PersistenceFailed {
            message: format!("{}: {}", path.display(), e),
        })
}
