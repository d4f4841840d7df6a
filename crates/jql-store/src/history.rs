//! Search history
//!
//! Every executed search is kept with its steps and a snapshot of the issues
//! it found, so later follow-ups can work without searching again.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use jql_core::stage::{find_result, names};
use jql_core::{IssueLink, StepRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::file::{read_json, write_json};

/// Entries kept on disk.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub jql: String,
    #[serde(rename = "maxResults", default)]
    pub max_results: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<IssueLink>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analysis: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(query: impl Into<String>, jql: impl Into<String>, max_results: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            query: query.into().trim().to_string(),
            jql: jql.into(),
            max_results,
            steps: Vec::new(),
            issues: Vec::new(),
            analysis: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_steps(mut self, steps: Vec<StepRecord>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_issues(mut self, issues: Vec<IssueLink>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_analysis(mut self, analysis: Option<String>) -> Self {
        self.analysis = analysis.unwrap_or_default();
        self
    }

    /// Raw payload recorded by the search step.
    pub fn search_payload(&self) -> Option<&Value> {
        find_result(&self.steps, names::EXECUTE_SEARCH)
    }

    /// Snapshot issues whose key, title or URL contains `needle`,
    /// case-insensitively. A blank needle matches nothing.
    pub fn matching_issues(&self, needle: &str) -> Vec<IssueLink> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.issues
            .iter()
            .filter(|issue| {
                format!("{} {} {}", issue.key, issue.title, issue.url)
                    .to_lowercase()
                    .contains(&needle)
            })
            .cloned()
            .collect()
    }
}

/// Append-only history backed by one JSON file, oldest entry first on disk.
pub struct HistoryStore {
    path: PathBuf,
    entries: Mutex<Vec<HistoryEntry>>,
    limit: usize,
}

impl HistoryStore {
    /// Open the store. A missing file is an empty history; an unreadable one
    /// is logged and replaced on the next append.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match read_json::<Vec<HistoryEntry>>(&path) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "history file unreadable, starting empty");
                Vec::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "history loaded");
        Self {
            path,
            entries: Mutex::new(entries),
            limit: HISTORY_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn append(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.push(entry);
        if entries.len() > self.limit {
            let excess = entries.len() - self.limit;
            entries.drain(..excess);
        }
        write_json(&self.path, entries.as_slice())
    }

    /// Up to `n` entries, newest first. `0` means all.
    pub fn latest(&self, n: usize) -> Vec<HistoryEntry> {
        let Ok(entries) = self.entries.lock() else {
            return Vec::new();
        };
        let n = if n == 0 { entries.len() } else { n };
        entries.iter().rev().take(n).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<HistoryEntry> {
        let entries = self.entries.lock().ok()?;
        entries.iter().rev().find(|e| e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
