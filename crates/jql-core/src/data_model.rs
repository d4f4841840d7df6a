//! Data Model: request, intents, date ranges, tracker records
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::parse_tracker_datetime;
use crate::MAX_RESULTS_CAP;

/// A search request as received from the caller. Immutable once received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Natural language or partial JQL
    #[serde(rename = "query", default)]
    pub raw_text: String,
    /// Explicit JQL override, used verbatim
    #[serde(rename = "jql", default)]
    pub explicit_query: String,
    #[serde(rename = "maxResults", default)]
    pub result_limit: i64,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(rename = "dryRun", default)]
    pub dry_run: bool,
    #[serde(rename = "analysis", default)]
    pub wants_analysis: bool,
    #[serde(rename = "sprintId", default)]
    pub sprint_id: i64,
}

impl QueryRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, jql: impl Into<String>) -> Self {
        self.explicit_query = jql.into();
        self
    }

    pub fn with_projects(mut self, projects: &[&str]) -> Self {
        self.projects = projects.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_users(mut self, users: &[&str]) -> Self {
        self.users = users.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn with_sprint(mut self, sprint_id: i64) -> Self {
        self.sprint_id = sprint_id;
        self
    }

    /// Result limit clamped to `1..=MAX_RESULTS_CAP`; out-of-range means the cap.
    pub fn effective_limit(&self) -> u32 {
        if self.result_limit <= 0 || self.result_limit > MAX_RESULTS_CAP as i64 {
            MAX_RESULTS_CAP
        } else {
            self.result_limit as u32
        }
    }

    pub fn sprint(&self) -> Option<u64> {
        (self.sprint_id > 0).then_some(self.sprint_id as u64)
    }

    pub fn project_keys(&self) -> Vec<String> {
        non_empty(&self.projects)
    }

    pub fn user_names(&self) -> Vec<String> {
        non_empty(&self.users)
    }

    pub fn field_list(&self) -> Vec<String> {
        non_empty(&self.fields)
    }
}

/// Trim entries and drop the empty ones.
pub fn non_empty(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Intents derived once per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSet {
    #[serde(rename = "bug")]
    pub is_bug: bool,
    #[serde(rename = "worklog")]
    pub is_worklog: bool,
    #[serde(rename = "sprint")]
    pub is_sprint_scoped: bool,
}

impl IntentSet {
    pub fn labels(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.is_bug {
            out.push("bug");
        }
        if self.is_worklog {
            out.push("worklog");
        }
        if self.is_sprint_scoped {
            out.push("sprint");
        }
        if out.is_empty() {
            out.push("generic");
        }
        out
    }
}

/// Where a date range came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    ExplicitId,
    ExplicitNumber,
    ActiveLookup,
    FallbackHeuristic,
}

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source: RangeSource,
}

impl DateRange {
    /// `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate, source: RangeSource) -> Option<Self> {
        (start <= end).then_some(Self { start, end, source })
    }

    pub fn start_literal(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_literal(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Sprint as returned by the agile API. Dates stay raw until asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(rename = "startDate", default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Sprint {
    /// Calendar range of the sprint in its own offset, if both dates parse
    /// and are ordered.
    pub fn usable_range(&self, source: RangeSource) -> Option<DateRange> {
        let start = parse_tracker_datetime(self.start_date.as_deref()?)?;
        let end = parse_tracker_datetime(self.end_date.as_deref()?)?;
        DateRange::new(start.date_naive(), end.date_naive(), source)
    }

    /// Sort key: end date, missing dates sort last.
    pub fn end_key(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.end_date
            .as_deref()
            .and_then(parse_tracker_datetime)
            .map(|d| d.with_timezone(&chrono::Utc))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklogAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "accountId", default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// One recorded unit of time. Read-only, filtered but never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorklogEntry {
    #[serde(default)]
    pub author: WorklogAuthor,
    #[serde(rename = "timeSpentSeconds", default)]
    pub elapsed_seconds: i64,
    #[serde(rename = "started", default)]
    pub started: String,
}

impl WorklogEntry {
    /// Case-insensitive match of any author identifier against `authors`.
    /// An empty filter matches everyone.
    pub fn authored_by(&self, authors: &[String]) -> bool {
        if authors.is_empty() {
            return true;
        }
        let ids = [
            Some(self.author.name.as_str()),
            self.author.key.as_deref(),
            self.author.account_id.as_deref(),
        ];
        authors.iter().any(|wanted| {
            let wanted = wanted.trim().to_lowercase();
            ids.iter()
                .flatten()
                .map(|id| id.trim())
                .any(|id| !id.is_empty() && id.to_lowercase() == wanted)
        })
    }
}

/// A page of search results: the opaque payload plus its reported total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub raw: Value,
    pub total: u64,
}

impl SearchPage {
    pub fn from_raw(raw: Value) -> Self {
        let total = raw.get("total").and_then(Value::as_u64).unwrap_or(0);
        Self { raw, total }
    }

    /// Browse links for the issues on this page.
    pub fn issue_links(&self, base_url: &str) -> Vec<IssueLink> {
        let base = base_url.trim_end_matches('/');
        self.raw
            .get("issues")
            .and_then(Value::as_array)
            .map(|issues| {
                issues
                    .iter()
                    .filter_map(|issue| {
                        let key = issue.get("key")?.as_str()?.to_string();
                        let title = issue
                            .pointer("/fields/summary")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string();
                        let url = format!("{}/browse/{}", base, key);
                        Some(IssueLink { key, title, url })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
    pub key: String,
    pub title: String,
    pub url: String,
}
