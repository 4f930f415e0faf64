//! Waiting line with VIP insertion
//!
//! Priority entries always form a contiguous prefix of the line. A new VIP is
//! placed right after the VIPs already at the front, so whoever is about to be
//! served is never bumped by a later arrival.

use crate::types::{Entry, EntryId};
use serde::Serialize;
use std::collections::VecDeque;

/// Ordered sequence of entries that have not been served yet
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct WaitingLine<D> {
    entries: VecDeque<Entry<D>>,
}

impl<D> WaitingLine<D> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Index a new entry of the given class would be inserted at
    pub fn insertion_index(&self, is_priority: bool) -> usize {
        if is_priority {
            self.leading_priority_run()
        } else {
            self.entries.len()
        }
    }

    /// Number of priority entries occupying the front of the line
    fn leading_priority_run(&self) -> usize {
        self.entries
            .iter()
            .take_while(|entry| entry.is_priority)
            .count()
    }

    /// Insert an entry according to its priority flag and return its index
    pub fn insert(&mut self, entry: Entry<D>) -> usize {
        let index = self.insertion_index(entry.is_priority);
        self.entries.insert(index, entry);
        index
    }

    /// Remove the head of the line, whatever its class
    pub fn pop_front(&mut self) -> Option<Entry<D>> {
        self.entries.pop_front()
    }

    pub fn front(&self) -> Option<&Entry<D>> {
        self.entries.front()
    }

    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn priority_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_priority).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<D>> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Check the VIP-prefix invariant
    pub fn is_well_ordered(&self) -> bool {
        let run = self.leading_priority_run();
        self.entries.iter().skip(run).all(|entry| !entry.is_priority)
    }
}

impl<D> Default for WaitingLine<D> {
    fn default() -> Self {
        Self::new()
    }
}
