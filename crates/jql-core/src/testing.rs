//! In-memory doubles for the capabilities, shared by the test suites of the
//! downstream crates (enable the `testing` feature).
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::capability::{AssistantError, IssueTracker, QueryAssistant, SprintState, TrackerError};
use crate::data_model::{Board, SearchPage, Sprint};

/// Tracker backed by fixed data. Records every call it receives.
#[derive(Debug, Default)]
pub struct StaticTracker {
    requester: String,
    base_url: String,
    issues: Vec<Value>,
    search_failure: Option<TrackerError>,
    paths: HashMap<String, Value>,
    sprints: HashMap<(u64, &'static str), Vec<Sprint>>,
    sprints_by_id: HashMap<u64, Sprint>,
    boards: HashMap<String, Vec<Board>>,
    agile_down: bool,
    calls: Mutex<Vec<String>>,
}

impl StaticTracker {
    pub fn new(requester: &str) -> Self {
        Self {
            requester: requester.to_string(),
            base_url: "https://jira.example.com".to_string(),
            ..Self::default()
        }
    }

    pub fn with_issues(mut self, issues: Vec<Value>) -> Self {
        self.issues = issues;
        self
    }

    pub fn failing_search(mut self, err: TrackerError) -> Self {
        self.search_failure = Some(err);
        self
    }

    pub fn with_path(mut self, path: &str, body: Value) -> Self {
        self.paths.insert(path.to_string(), body);
        self
    }

    pub fn with_sprints(mut self, board_id: u64, state: SprintState, sprints: Vec<Sprint>) -> Self {
        for sprint in &sprints {
            self.sprints_by_id.insert(sprint.id, sprint.clone());
        }
        self.sprints.insert((board_id, state.as_str()), sprints);
        self
    }

    pub fn with_sprint(mut self, sprint: Sprint) -> Self {
        self.sprints_by_id.insert(sprint.id, sprint);
        self
    }

    pub fn with_boards(mut self, project_key: &str, boards: Vec<Board>) -> Self {
        self.boards.insert(project_key.to_string(), boards);
        self
    }

    /// Every agile endpoint answers 503.
    pub fn agile_unavailable(mut self) -> Self {
        self.agile_down = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn agile_guard(&self) -> Result<(), TrackerError> {
        if self.agile_down {
            return Err(TrackerError::Status {
                status: 503,
                message: "jira: 503 Service Unavailable".to_string(),
                body: String::new(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for StaticTracker {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        start_at: u64,
        fields: &[String],
    ) -> Result<SearchPage, TrackerError> {
        self.record(format!(
            "search start_at={} max={} fields={} jql={}",
            start_at,
            max_results,
            fields.join(","),
            query
        ));
        if let Some(err) = &self.search_failure {
            return Err(err.clone());
        }
        let from = (start_at as usize).min(self.issues.len());
        let to = (from + max_results as usize).min(self.issues.len());
        let raw = json!({
            "startAt": start_at,
            "maxResults": max_results,
            "total": self.issues.len(),
            "issues": self.issues[from..to].to_vec(),
        });
        Ok(SearchPage::from_raw(raw))
    }

    async fn get(&self, path: &str) -> Result<Value, TrackerError> {
        self.record(format!("get {}", path));
        self.paths.get(path).cloned().ok_or_else(|| TrackerError::Status {
            status: 404,
            message: "jira: 404 Not Found".to_string(),
            body: String::new(),
        })
    }

    async fn list_sprints(
        &self,
        board_id: u64,
        state: SprintState,
        max_results: u32,
    ) -> Result<Vec<Sprint>, TrackerError> {
        self.record(format!("list_sprints board={} state={} max={}", board_id, state.as_str(), max_results));
        self.agile_guard()?;
        Ok(self
            .sprints
            .get(&(board_id, state.as_str()))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_sprint(&self, sprint_id: u64) -> Result<Sprint, TrackerError> {
        self.record(format!("get_sprint {}", sprint_id));
        self.agile_guard()?;
        self.sprints_by_id.get(&sprint_id).cloned().ok_or_else(|| TrackerError::Status {
            status: 404,
            message: "jira: 404 Not Found".to_string(),
            body: String::new(),
        })
    }

    async fn active_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, TrackerError> {
        self.record(format!("active_sprints board={}", board_id));
        self.agile_guard()?;
        Ok(self
            .sprints
            .get(&(board_id, SprintState::Active.as_str()))
            .cloned()
            .unwrap_or_default())
    }

    async fn boards_for_project(&self, project_key: &str) -> Result<Vec<Board>, TrackerError> {
        self.record(format!("boards_for_project {}", project_key));
        self.agile_guard()?;
        Ok(self.boards.get(project_key).cloned().unwrap_or_default())
    }

    async fn myself(&self) -> Result<Value, TrackerError> {
        Ok(json!({ "name": self.requester }))
    }

    fn requester(&self) -> &str {
        &self.requester
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Assistant with canned answers.
#[derive(Debug, Default)]
pub struct ScriptedAssistant {
    pub derived: Option<String>,
    pub summary: Option<String>,
    pub answer: Option<String>,
}

impl ScriptedAssistant {
    pub fn deriving(query: &str) -> Self {
        Self {
            derived: Some(query.to_string()),
            ..Self::default()
        }
    }

    pub fn summarizing(summary: &str) -> Self {
        Self {
            summary: Some(summary.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl QueryAssistant for ScriptedAssistant {
    async fn derive_query(&self, _raw_text: &str) -> Result<String, AssistantError> {
        self.derived
            .clone()
            .ok_or_else(|| AssistantError::Request("no scripted query".to_string()))
    }

    async fn summarize(
        &self,
        _raw_text: &str,
        _query: &str,
        _payload: &Value,
    ) -> Result<String, AssistantError> {
        self.summary.clone().ok_or(AssistantError::NoChoices)
    }

    async fn follow_up(&self, _context: &str, _command: &str) -> Result<String, AssistantError> {
        self.answer.clone().ok_or(AssistantError::NoChoices)
    }
}
