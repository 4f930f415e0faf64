//! Served-customer history log
//!
//! Newest first. The log itself is unbounded; views such as `recent` cap what
//! callers display.

use crate::types::{Entry, EntryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct History<D> {
    served: VecDeque<Entry<D>>,
}

impl<D> History<D> {
    pub fn new() -> Self {
        Self {
            served: VecDeque::new(),
        }
    }

    /// Record a served entry as the most recent one
    pub fn record(&mut self, entry: Entry<D>) {
        self.served.push_front(entry);
    }

    /// Most recently served entry
    pub fn latest(&self) -> Option<&Entry<D>> {
        self.served.front()
    }

    /// Up to `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &Entry<D>> {
        self.served.iter().take(limit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<D>> {
        self.served.iter()
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.served.iter().map(|entry| entry.id).collect()
    }

    pub fn len(&self) -> usize {
        self.served.len()
    }

    pub fn is_empty(&self) -> bool {
        self.served.is_empty()
    }

    pub fn clear(&mut self) {
        self.served.clear();
    }
}

impl<D> Default for History<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time dump of a session's history, written as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySnapshot<D> {
    pub session_id: Uuid,
    pub taken_at: DateTime<Utc>,
    pub served: Vec<Entry<D>>,
}

impl<D: Clone> HistorySnapshot<D> {
    pub fn capture(session_id: Uuid, history: &History<D>) -> Self {
        Self {
            session_id,
            taken_at: Utc::now(),
            served: history.iter().cloned().collect(),
        }
    }
}

impl<D: Serialize> HistorySnapshot<D> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn served(id: EntryId) -> Entry<&'static str> {
        Entry::new(id, "guest", false)
    }

    #[test]
    fn test_record_prepends() {
        let mut history = History::new();
        history.record(served(101));
        history.record(served(102));
        history.record(served(103));
        assert_eq!(history.ids(), vec![103, 102, 101]);
        assert_eq!(history.latest().map(|e| e.id), Some(103));
    }

    #[test]
    fn test_recent_caps_view_not_log() {
        let mut history = History::new();
        for id in 0..10 {
            history.record(served(id));
        }
        let recent: Vec<_> = history.recent(6).map(|e| e.id).collect();
        assert_eq!(recent, vec![9, 8, 7, 6, 5, 4]);
        assert_eq!(history.len(), 10);
    }

    #[test]
    fn test_snapshot_json() {
        let mut history = History::new();
        history.record(served(7));
        let session_id = Uuid::new_v4();
        let snapshot = HistorySnapshot::capture(session_id, &history);
        let json = snapshot.to_json().unwrap();

        let parsed: HistorySnapshot<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session_id, session_id);
        assert_eq!(parsed.served.len(), 1);
        assert_eq!(parsed.served[0].id, 7);
    }
}
