//! Priority queue manager
//!
//! Owns the waiting line, the served history and the ticket counter for one
//! session. All operations are synchronous and run to completion; callers
//! that share a manager across tasks wrap it in a single lock.

use crate::error::{QueueError, QueueResult};
use crate::queue::history::History;
use crate::queue::line::WaitingLine;
use crate::types::{Entry, EntryId, ServedInfo, DEFAULT_TICKET_BASE, MAX_TICKET_BASE};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Counters describing what the manager has done this session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueManagerStats {
    /// Tickets handed out since the last reset
    pub tickets_issued: u64,
    /// VIP tickets handed out since the last reset
    pub vip_tickets_issued: u64,
    /// Customers served since the last reset
    pub tickets_served: u64,
    /// Current number of customers waiting
    pub waiting: usize,
    /// Current number of VIPs waiting
    pub vip_waiting: usize,
    /// Current history length
    pub history_len: usize,
}

/// The queue core: FIFO line with VIP insertion plus a served log
#[derive(Debug, Clone)]
pub struct PriorityQueueManager<D> {
    line: WaitingLine<D>,
    history: History<D>,
    base_id: EntryId,
    next_id: EntryId,
    tickets_issued: u64,
    vip_tickets_issued: u64,
}

impl<D> PriorityQueueManager<D> {
    /// Create a manager whose first ticket is `base_id`.
    ///
    /// Bases above `MAX_TICKET_BASE` are clamped so the counter can never
    /// overflow and `add` stays infallible.
    pub fn new(base_id: EntryId) -> Self {
        let base_id = if base_id > MAX_TICKET_BASE {
            warn!(
                "Ticket base {} exceeds {}, clamping",
                base_id, MAX_TICKET_BASE
            );
            MAX_TICKET_BASE
        } else {
            base_id
        };

        Self {
            line: WaitingLine::new(),
            history: History::new(),
            base_id,
            next_id: base_id,
            tickets_issued: 0,
            vip_tickets_issued: 0,
        }
    }

    /// Add a customer to the line and return the created entry.
    ///
    /// Regular tickets join at the back. VIP tickets go directly behind the
    /// VIPs already at the front of the line, ahead of every regular ticket.
    pub fn add(&mut self, display: D, is_priority: bool) -> Entry<D>
    where
        D: Clone,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.tickets_issued += 1;
        if is_priority {
            self.vip_tickets_issued += 1;
        }

        let entry = Entry::new(id, display, is_priority);
        let index = self.line.insert(entry.clone());

        debug!(
            "Ticket #{} ({}) inserted at position {} of {}",
            id,
            entry.class(),
            index,
            self.line.len()
        );

        entry
    }

    /// Serve the head of the line with no decorative message
    pub fn serve_next(&mut self) -> QueueResult<Entry<D>>
    where
        D: Clone,
    {
        self.serve_next_with_message(None)
    }

    /// Serve the head of the line, stamping it with `message`.
    ///
    /// Returns `EmptyQueue` without touching any state when nobody waits.
    pub fn serve_next_with_message(&mut self, message: Option<String>) -> QueueResult<Entry<D>>
    where
        D: Clone,
    {
        let Some(mut entry) = self.line.pop_front() else {
            debug!("Serve requested on an empty line");
            return Err(QueueError::EmptyQueue);
        };

        entry.served = Some(ServedInfo {
            served_at: current_timestamp(),
            message,
        });
        self.history.record(entry.clone());

        debug!(
            "Ticket #{} ({}) served, {} still waiting",
            entry.id,
            entry.class(),
            self.line.len()
        );

        Ok(entry)
    }

    /// Entry that would be served next, if any
    pub fn peek_next(&self) -> Option<&Entry<D>> {
        self.line.front()
    }

    /// Drop all waiting and served entries and restart the ticket counter
    pub fn reset(&mut self) {
        info!(
            "Resetting queue: dropping {} waiting and {} served, counter back to {}",
            self.line.len(),
            self.history.len(),
            self.base_id
        );
        self.line.clear();
        self.history.clear();
        self.next_id = self.base_id;
        self.tickets_issued = 0;
        self.vip_tickets_issued = 0;
    }

    pub fn waiting(&self) -> &WaitingLine<D> {
        &self.line
    }

    pub fn history(&self) -> &History<D> {
        &self.history
    }

    /// Up to `limit` most recently served entries
    pub fn recent_history(&self, limit: usize) -> Vec<&Entry<D>> {
        self.history.recent(limit).collect()
    }

    /// Zero-based place in line of a waiting ticket
    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.line.position_of(id)
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    pub fn priority_count(&self) -> usize {
        self.line.priority_count()
    }

    /// Ticket number the next `add` will assign
    pub fn next_id(&self) -> EntryId {
        self.next_id
    }

    pub fn base_id(&self) -> EntryId {
        self.base_id
    }

    pub fn stats(&self) -> QueueManagerStats {
        QueueManagerStats {
            tickets_issued: self.tickets_issued,
            vip_tickets_issued: self.vip_tickets_issued,
            tickets_served: self.history.len() as u64,
            waiting: self.line.len(),
            vip_waiting: self.line.priority_count(),
            history_len: self.history.len(),
        }
    }
}

impl<D> Default for PriorityQueueManager<D> {
    fn default() -> Self {
        Self::new(DEFAULT_TICKET_BASE)
    }
}
