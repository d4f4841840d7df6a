use jql_core::data_model::non_empty;
use jql_core::{ExecutionContext, IssueTracker, QueryError, WorklogEntry};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::filter::{counts_towards, WorklogWindow};
use crate::WorklogSummary;

/// Issues fetched per search page.
pub const PAGE_SIZE: u32 = 50;
/// Upper bound on issues scanned per aggregation.
pub const ISSUE_CAP: u64 = 2000;
const WORKLOG_PAGE: u64 = 1000;

/// Path of one page of an issue's full worklog.
pub fn worklog_path(issue_key: &str, start_at: u64) -> String {
    format!(
        "/rest/api/2/issue/{}/worklog?startAt={}&maxResults={}",
        issue_key, start_at, WORKLOG_PAGE
    )
}

/// Worklog as embedded in a search hit or returned by the worklog endpoint.
#[derive(Debug, Default, Deserialize)]
struct WorklogPage {
    #[serde(default)]
    worklogs: Vec<WorklogEntry>,
    #[serde(default)]
    total: Option<u64>,
}

impl WorklogPage {
    fn from_issue(issue: &Value) -> Self {
        issue
            .pointer("/fields/worklog")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    fn is_truncated(&self) -> bool {
        self.total.is_some_and(|t| t > self.worklogs.len() as u64)
    }
}

pub struct WorklogAggregator<'a> {
    tracker: &'a dyn IssueTracker,
    page_size: u32,
    issue_cap: u64,
}

impl<'a> WorklogAggregator<'a> {
    pub fn new(tracker: &'a dyn IssueTracker) -> Self {
        Self {
            tracker,
            page_size: PAGE_SIZE,
            issue_cap: ISSUE_CAP,
        }
    }

    pub fn with_limits(mut self, page_size: u32, issue_cap: u64) -> Self {
        self.page_size = page_size.max(1);
        self.issue_cap = issue_cap;
        self
    }

    /// Sum this month's logged time of `authors` (the requester when empty)
    /// over every issue `query` matches.
    ///
    /// Only a failed search page fails the aggregation; a failed full-worklog
    /// fetch keeps the embedded entries of that issue.
    pub async fn sum_hours(
        &self,
        ctx: &ExecutionContext,
        query: &str,
        authors: &[String],
    ) -> Result<WorklogSummary, QueryError> {
        let mut authors = non_empty(authors);
        if authors.is_empty() && !self.tracker.requester().trim().is_empty() {
            authors.push(self.tracker.requester().trim().to_string());
        }
        let window = WorklogWindow::month_of(ctx.now);
        let fields = vec!["worklog".to_string()];

        let mut seconds = 0i64;
        let mut entries_counted = 0u64;
        let mut issues_scanned = 0u64;
        let mut start_at = 0u64;
        let mut reported_total = 0u64;

        while start_at < self.issue_cap {
            // The last page stops at the cap.
            let max = (self.issue_cap - start_at).min(u64::from(self.page_size)) as u32;
            let page = ctx
                .call(self.tracker.search(query, max, start_at, &fields))
                .await?
                .map_err(|err| QueryError::Aggregation(format!("search page at {}: {}", start_at, err)))?;
            reported_total = page.total;

            let issues = page
                .raw
                .get("issues")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if issues.is_empty() {
                break;
            }

            for issue in &issues {
                let entries = self.issue_entries(ctx, issue).await?;
                for entry in entries.iter().filter(|e| counts_towards(e, &authors, &window)) {
                    seconds += entry.elapsed_seconds;
                    entries_counted += 1;
                }
            }
            issues_scanned += issues.len() as u64;

            let advanced = page
                .raw
                .get("maxResults")
                .and_then(Value::as_u64)
                .filter(|n| *n > 0)
                .unwrap_or(issues.len() as u64);
            start_at += advanced;
            if start_at >= page.total {
                break;
            }
        }

        let possibly_incomplete = start_at >= self.issue_cap && reported_total > start_at;
        if possibly_incomplete {
            warn!(cap = self.issue_cap, total = reported_total, "worklog scan stopped at the issue cap");
        }
        debug!(issues = issues_scanned, entries = entries_counted, seconds, "worklog aggregated");

        Ok(WorklogSummary {
            hours: seconds as f64 / 3600.0,
            seconds,
            issues_scanned,
            entries_counted,
            possibly_incomplete,
            window,
        })
    }

    /// Entries of one search hit. A truncated embedded worklog is replaced
    /// by the issue's full worklog when that fetch succeeds.
    async fn issue_entries(
        &self,
        ctx: &ExecutionContext,
        issue: &Value,
    ) -> Result<Vec<WorklogEntry>, QueryError> {
        let embedded = WorklogPage::from_issue(issue);
        if !embedded.is_truncated() {
            return Ok(embedded.worklogs);
        }
        let Some(key) = issue.get("key").and_then(Value::as_str) else {
            return Ok(embedded.worklogs);
        };
        match self.full_worklog(ctx, key).await? {
            Some(full) => Ok(full),
            None => Ok(embedded.worklogs),
        }
    }

    async fn full_worklog(
        &self,
        ctx: &ExecutionContext,
        key: &str,
    ) -> Result<Option<Vec<WorklogEntry>>, QueryError> {
        let mut all = Vec::new();
        loop {
            let path = worklog_path(key, all.len() as u64);
            let body = match ctx.call(self.tracker.get(&path)).await? {
                Ok(body) => body,
                Err(err) => {
                    warn!(issue = key, error = %err, "full worklog fetch failed, keeping embedded entries");
                    return Ok(None);
                }
            };
            let page: WorklogPage = match serde_json::from_value(body) {
                Ok(page) => page,
                Err(err) => {
                    warn!(issue = key, error = %err, "unreadable worklog payload");
                    return Ok(None);
                }
            };
            let fetched = page.worklogs.len();
            all.extend(page.worklogs);
            let total = page.total.unwrap_or(all.len() as u64);
            if fetched == 0 || all.len() as u64 >= total {
                return Ok(Some(all));
            }
        }
    }
}
