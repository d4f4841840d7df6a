//! Step records: the ordered, append-only audit trail of one request.
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    Failed,
    Skipped,
}

/// One user-visible pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl StepRecord {
    pub fn completed(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            status: StepStatus::Completed,
            result: None,
        }
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

/// Stage names shared between the pipeline and the consumers of its history.
pub mod names {
    pub const GENERATE_QUERY: &str = "Generate JQL";
    pub const EXECUTE_SEARCH: &str = "Execute Jira search";
    pub const ANALYSIS: &str = "Analysis";
    pub const ISSUE_DETAILS: &str = "Issue details";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepLog {
    steps: Vec<StepRecord>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn into_inner(self) -> Vec<StepRecord> {
        self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Result payload of the first completed step called `name`.
    pub fn result_of(&self, name: &str) -> Option<&Value> {
        find_result(&self.steps, name)
    }
}

pub fn find_result<'a>(steps: &'a [StepRecord], name: &str) -> Option<&'a Value> {
    steps
        .iter()
        .find(|s| s.name == name && s.result.is_some())
        .and_then(|s| s.result.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_preserves_order() {
        let mut log = StepLog::new();
        log.push(StepRecord::completed(names::GENERATE_QUERY, "derived"));
        log.push(
            StepRecord::completed(names::EXECUTE_SEARCH, "Fetched 2 issues")
                .with_result(json!({ "total": 2 })),
        );
        let order: Vec<_> = log.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec![names::GENERATE_QUERY, names::EXECUTE_SEARCH]);
        assert_eq!(log.result_of(names::EXECUTE_SEARCH), Some(&json!({ "total": 2 })));
    }

    #[test]
    fn test_status_wire_format() {
        let step = StepRecord::completed("x", "");
        let v = serde_json::to_value(&step).unwrap();
        assert_eq!(v, json!({ "name": "x", "status": "completed" }));
    }
}
