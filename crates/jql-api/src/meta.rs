//! Reference data dump: fields, projects, statuses, issue types, priorities,
//! per-project versions and agile boards, one JSON file each, plus a
//! `summary.json` log of what was fetched.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use jql_core::{ExecutionContext, IssueTracker, QueryError};
use jql_store::{write_json, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Endpoints dumped as-is, by output name.
pub const REFERENCE_ENDPOINTS: [(&str, &str); 5] = [
    ("jira_fields", "/rest/api/2/field"),
    ("jira_projects", "/rest/api/2/project"),
    ("jira_statuses", "/rest/api/2/status"),
    ("jira_issue_types", "/rest/api/2/issuetype"),
    ("jira_priorities", "/rest/api/2/priority"),
];
pub const VERSIONS: &str = "jira_versions";
pub const BOARDS: &str = "jira_boards";
pub const BOARDS_PATH: &str = "/rest/agile/1.0/board";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Error)]
pub enum MetaError {
    #[error("metadata fetch interrupted: {0}")]
    Interrupted(#[from] QueryError),
    #[error("cannot write summary: {0}")]
    Store(#[from] StoreError),
    #[error("{failed} metadata fetches failed, see {}", .summary.display())]
    Incomplete { failed: usize, summary: PathBuf },
}

/// One line of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchRecord {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: String::new(),
            fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            error: None,
        }
    }

    fn written(mut self, path: &Path) -> Self {
        self.path = path.display().to_string();
        self
    }

    fn failed(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
struct ProjectId {
    #[serde(default)]
    id: String,
}

pub struct MetadataFetcher {
    tracker: Arc<dyn IssueTracker>,
    out_dir: PathBuf,
}

impl MetadataFetcher {
    pub fn new(tracker: Arc<dyn IssueTracker>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            tracker,
            out_dir: out_dir.into(),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{}.json", name))
    }

    /// Fetch everything and write `summary.json`. Individual failures are
    /// recorded and reported together as [`MetaError::Incomplete`] once the
    /// summary is on disk; boards are best effort and never fail the run.
    pub async fn fetch_all(&self, ctx: &ExecutionContext) -> Result<Vec<FetchRecord>, MetaError> {
        let mut summary = Vec::new();
        let mut projects = None;

        for (name, path) in REFERENCE_ENDPOINTS {
            let record = FetchRecord::new(name);
            let record = match ctx.call(self.tracker.get(path)).await? {
                Ok(body) => {
                    let record = self.save(record, &body);
                    if name == "jira_projects" {
                        projects = Some(body);
                    }
                    record
                }
                Err(err) => {
                    warn!(endpoint = name, error = %err, "metadata fetch failed");
                    record.failed(err)
                }
            };
            summary.push(record);
        }

        let versions = FetchRecord::new(VERSIONS);
        let versions = match projects {
            Some(projects) => match self.versions(ctx, projects).await? {
                Ok(by_project) => self.save(versions, &by_project),
                Err(err) => versions.failed(err),
            },
            None => versions.failed("project list unavailable"),
        };
        summary.push(versions);

        match ctx.call(self.tracker.get(BOARDS_PATH)).await? {
            Ok(boards) => {
                if let Err(err) = write_json(&self.file(BOARDS), &boards) {
                    debug!(error = %err, "boards not saved");
                }
            }
            Err(err) => debug!(error = %err, "boards unavailable"),
        }

        let summary_path = self.out_dir.join(SUMMARY_FILE);
        write_json(&summary_path, &summary)?;

        let failed = summary.iter().filter(|r| r.error.is_some()).count();
        if failed > 0 {
            return Err(MetaError::Incomplete {
                failed,
                summary: summary_path,
            });
        }
        info!(dir = %self.out_dir.display(), files = summary.len(), "metadata fetched");
        Ok(summary)
    }

    fn save<T: Serialize + ?Sized>(&self, record: FetchRecord, body: &T) -> FetchRecord {
        let path = self.file(&record.name);
        match write_json(&path, body) {
            Ok(()) => record.written(&path),
            Err(err) => record.failed(err),
        }
    }

    /// Versions keyed by project id. Projects whose versions cannot be read
    /// are skipped.
    async fn versions(
        &self,
        ctx: &ExecutionContext,
        projects: Value,
    ) -> Result<Result<BTreeMap<String, Value>, String>, QueryError> {
        let projects: Vec<ProjectId> = match serde_json::from_value(projects) {
            Ok(projects) => projects,
            Err(err) => return Ok(Err(format!("parse projects: {}", err))),
        };
        let mut by_project = BTreeMap::new();
        for project in projects.into_iter().filter(|p| !p.id.is_empty()) {
            let path = format!("/rest/api/2/project/{}/versions", project.id);
            match ctx.call(self.tracker.get(&path)).await? {
                Ok(body) => {
                    by_project.insert(project.id, body);
                }
                Err(err) => debug!(project = %project.id, error = %err, "versions skipped"),
            }
        }
        Ok(Ok(by_project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_omits_empty_fields() {
        let record = FetchRecord {
            name: "jira_fields".to_string(),
            path: String::new(),
            fetched_at: "2025-01-02T03:04:05Z".to_string(),
            error: Some("jira: 401 Unauthorized".to_string()),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "jira_fields",
                "fetchedAt": "2025-01-02T03:04:05Z",
                "error": "jira: 401 Unauthorized"
            })
        );
    }
}
