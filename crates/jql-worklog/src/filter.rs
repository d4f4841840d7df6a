use chrono::{DateTime, Utc};
use jql_core::time::{month_window, parse_tracker_utc};
use jql_core::WorklogEntry;
use serde::{Deserialize, Serialize};

/// Inclusive time window entries must start in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklogWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WorklogWindow {
    /// The calendar month containing `now`, UTC.
    pub fn month_of(now: DateTime<Utc>) -> Self {
        let (start, end) = month_window(now);
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Entry is by one of `authors` and started inside `window`. Entries with an
/// unreadable start time never count.
pub fn counts_towards(entry: &WorklogEntry, authors: &[String], window: &WorklogWindow) -> bool {
    if !entry.authored_by(authors) {
        return false;
    }
    parse_tracker_utc(&entry.started)
        .map(|at| window.contains(at))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jql_core::WorklogAuthor;

    fn entry(author: &str, started: &str) -> WorklogEntry {
        WorklogEntry {
            author: WorklogAuthor {
                name: author.to_string(),
                ..WorklogAuthor::default()
            },
            elapsed_seconds: 1800,
            started: started.to_string(),
        }
    }

    fn window() -> WorklogWindow {
        WorklogWindow::month_of(Utc.with_ymd_and_hms(2025, 12, 17, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_window_edges_inclusive() {
        let authors = vec!["alice".to_string()];
        assert!(counts_towards(&entry("alice", "2025-12-01T00:00:00.000+0000"), &authors, &window()));
        assert!(counts_towards(&entry("alice", "2025-12-31T23:59:59+00:00"), &authors, &window()));
        assert!(!counts_towards(&entry("alice", "2026-01-01T00:00:00Z"), &authors, &window()));
        assert!(!counts_towards(&entry("alice", "2025-11-30T23:59:59Z"), &authors, &window()));
    }

    #[test]
    fn test_offset_moves_entry_out_of_month() {
        let authors = vec!["alice".to_string()];
        // 2025-12-01 01:00 +03:00 is still November in UTC.
        assert!(!counts_towards(&entry("alice", "2025-12-01T01:00:00.000+0300"), &authors, &window()));
    }

    #[test]
    fn test_author_and_garbage() {
        let authors = vec!["Alice".to_string()];
        assert!(counts_towards(&entry("alice", "2025-12-10T10:00:00.000+0000"), &authors, &window()));
        assert!(!counts_towards(&entry("bob", "2025-12-10T10:00:00.000+0000"), &authors, &window()));
        assert!(!counts_towards(&entry("alice", "10.12.2025"), &authors, &window()));
    }
}
