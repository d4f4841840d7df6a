//! Worklog aggregation.
//!
//! Sums the time logged in the current calendar month by a set of authors
//! across every issue a query matches. The search is paged and capped; an
//! issue whose embedded worklog is truncated has its full worklog fetched.
pub mod aggregator;
pub mod filter;

pub use aggregator::{worklog_path, WorklogAggregator, ISSUE_CAP, PAGE_SIZE};
pub use filter::{counts_towards, WorklogWindow};

use serde::{Deserialize, Serialize};

/// Result of one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorklogSummary {
    pub hours: f64,
    pub seconds: i64,
    pub issues_scanned: u64,
    pub entries_counted: u64,
    /// The issue cap stopped the scan while the tracker reported more.
    pub possibly_incomplete: bool,
    pub window: WorklogWindow,
}
