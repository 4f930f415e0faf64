//! Common types used throughout the cinema queue service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket number handed to a customer when they join the line
pub type EntryId = u64;

/// Ticket number the counter starts from unless configured otherwise
pub const DEFAULT_TICKET_BASE: EntryId = 101;

/// Highest accepted first ticket number; leaves room for 2^63 tickets
pub const MAX_TICKET_BASE: EntryId = EntryId::MAX / 2;

/// Class of a ticket, derived from the priority flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketClass {
    Vip,
    Regular,
}

impl TicketClass {
    pub fn from_priority(is_priority: bool) -> Self {
        if is_priority {
            TicketClass::Vip
        } else {
            TicketClass::Regular
        }
    }

    /// Label used for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketClass::Vip => "vip",
            TicketClass::Regular => "regular",
        }
    }
}

impl std::fmt::Display for TicketClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketClass::Vip => write!(f, "VIP"),
            TicketClass::Regular => write!(f, "Regular"),
        }
    }
}

/// Stamp applied to an entry when it leaves the line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedInfo {
    pub served_at: DateTime<Utc>,
    /// Decorative line shown next to the served customer, if any
    pub message: Option<String>,
}

/// A queued customer ticket.
///
/// `display` is carried through untouched; the queue never looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<D> {
    pub id: EntryId,
    pub display: D,
    pub is_priority: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub served: Option<ServedInfo>,
}

impl<D> Entry<D> {
    pub(crate) fn new(id: EntryId, display: D, is_priority: bool) -> Self {
        Self {
            id,
            display,
            is_priority,
            served: None,
        }
    }

    pub fn class(&self) -> TicketClass {
        TicketClass::from_priority(self.is_priority)
    }

    pub fn is_served(&self) -> bool {
        self.served.is_some()
    }
}

/// Presentation fields attached to every ticket in the cinema line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub avatar: String,
    pub snack: String,
    pub joined_at: DateTime<Utc>,
}

/// Ticket type used by the box office
pub type Ticket = Entry<CustomerProfile>;
