use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// Clause kinds the rewriter knows how to override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClauseKind {
    Project,
    Assignee,
    Reporter,
    WorklogAuthor,
}

impl ClauseKind {
    pub fn field(&self) -> &'static str {
        match self {
            ClauseKind::Project => "project",
            ClauseKind::Assignee => "assignee",
            ClauseKind::Reporter => "reporter",
            ClauseKind::WorklogAuthor => "worklogAuthor",
        }
    }

    pub const ALL: [ClauseKind; 4] = [
        ClauseKind::Project,
        ClauseKind::Assignee,
        ClauseKind::Reporter,
        ClauseKind::WorklogAuthor,
    ];

    fn matcher(&self) -> &'static Regex {
        match self {
            ClauseKind::Project => &PROJECT,
            ClauseKind::Assignee => &ASSIGNEE,
            ClauseKind::Reporter => &REPORTER,
            ClauseKind::WorklogAuthor => &WORKLOG_AUTHOR,
        }
    }
}

/// `field in (...)`, `field = currentUser()`, `field = "v"`, `field = v`
fn clause_pattern(field: &str) -> Regex {
    let pattern = format!(
        r#"(?i)^{}(?:\s+in\s*\(.*\)|\s*=\s*currentUser\(\)|\s*=\s*"(?:[^"\\]|\\.)*"|\s*=\s*\S+)$"#,
        field
    );
    Regex::new(&pattern).unwrap()
}

lazy_static! {
    static ref PROJECT: Regex = clause_pattern("project");
    static ref ASSIGNEE: Regex = clause_pattern("assignee");
    static ref REPORTER: Regex = clause_pattern("reporter");
    static ref WORKLOG_AUTHOR: Regex = clause_pattern("worklogAuthor");
}

/// One top-level clause together with the connector that precedes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub connector: Option<Connector>,
    pub text: String,
}

impl Clause {
    pub fn new(connector: Option<Connector>, text: impl Into<String>) -> Self {
        Self {
            connector,
            text: text.into(),
        }
    }

    pub fn and(text: impl Into<String>) -> Self {
        Self::new(Some(Connector::And), text)
    }

    /// The overridable kind this clause is, if any.
    pub fn kind(&self) -> Option<ClauseKind> {
        ClauseKind::ALL
            .into_iter()
            .find(|kind| kind.matcher().is_match(self.text.trim()))
    }

    pub fn is(&self, kind: ClauseKind) -> bool {
        kind.matcher().is_match(self.text.trim())
    }
}

/// A query as an ordered list of top-level clauses plus an optional
/// `ORDER BY` tail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseList {
    pub clauses: Vec<Clause>,
    pub order_by: Option<String>,
}

impl ClauseList {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn contains(&self, kind: ClauseKind) -> bool {
        self.clauses.iter().any(|c| c.is(kind))
    }

    pub fn count(&self, kind: ClauseKind) -> usize {
        self.clauses.iter().filter(|c| c.is(kind)).count()
    }

    /// Drop every clause of `kind`, returning how many went.
    pub fn remove_kind(&mut self, kind: ClauseKind) -> usize {
        let before = self.clauses.len();
        self.clauses.retain(|c| !c.is(kind));
        before - self.clauses.len()
    }

    pub fn retain(&mut self, keep: impl FnMut(&Clause) -> bool) {
        self.clauses.retain(keep);
    }

    pub fn push_and(&mut self, text: impl Into<String>) {
        self.clauses.push(Clause::and(text));
    }
}
