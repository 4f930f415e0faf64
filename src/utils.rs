//! Utility functions for the cinema queue service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique session ID
pub fn generate_session_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way tickets print it (HH:MM:SS)
pub fn ticket_clock(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

/// Whether the `served_count`-th customer hits a celebration milestone
pub fn is_milestone(served_count: usize, interval: usize) -> bool {
    interval > 0 && served_count > 0 && served_count % interval == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_ticket_clock() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 3).unwrap();
        assert_eq!(ticket_clock(&ts), "07:05:03");
    }

    #[test]
    fn test_is_milestone() {
        assert!(is_milestone(5, 5));
        assert!(is_milestone(10, 5));
        assert!(!is_milestone(4, 5));
        assert!(!is_milestone(0, 5));
        assert!(!is_milestone(5, 0));
    }
}
