//! Capabilities consumed by the pipeline.
//!
//! The issue tracker is mandatory; the generative assistant is optional and
//! its absence is a valid configuration.
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::data_model::{Board, SearchPage, Sprint};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackerError {
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },
    #[error("transport: {0}")]
    Transport(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("{0}")]
    Cancelled(String),
}

impl TrackerError {
    pub fn status(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            Self::Cancelled(_) => 504,
            _ => 502,
        }
    }
}

impl From<crate::context::Interrupted> for TrackerError {
    fn from(err: crate::context::Interrupted) -> Self {
        Self::Cancelled(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintState {
    Active,
    Future,
    Closed,
}

impl SprintState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Future => "future",
            Self::Closed => "closed",
        }
    }
}

/// Read path into the remote issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Run a JQL search. An empty `fields` list means the tracker default.
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        start_at: u64,
        fields: &[String],
    ) -> Result<SearchPage, TrackerError>;

    /// Raw GET of a REST path (with optional query string).
    async fn get(&self, path: &str) -> Result<Value, TrackerError>;

    async fn list_sprints(
        &self,
        board_id: u64,
        state: SprintState,
        max_results: u32,
    ) -> Result<Vec<Sprint>, TrackerError>;

    async fn get_sprint(&self, sprint_id: u64) -> Result<Sprint, TrackerError>;

    async fn active_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, TrackerError>;

    async fn boards_for_project(&self, project_key: &str) -> Result<Vec<Board>, TrackerError>;

    async fn myself(&self) -> Result<Value, TrackerError>;

    /// Identifier of the account the requests run as.
    fn requester(&self) -> &str;

    fn base_url(&self) -> &str;
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssistantError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("model returned no choices")]
    NoChoices,
    #[error("nothing to work with: {0}")]
    EmptyInput(&'static str),
}

/// Optional generative-model capability.
#[async_trait]
pub trait QueryAssistant: Send + Sync {
    /// Suggest JQL for a natural-language request. May return an empty string.
    async fn derive_query(&self, raw_text: &str) -> Result<String, AssistantError>;

    /// Summarize a search payload for the user.
    async fn summarize(
        &self,
        raw_text: &str,
        query: &str,
        payload: &Value,
    ) -> Result<String, AssistantError>;

    /// Answer a follow-up command about a past search.
    async fn follow_up(&self, context: &str, command: &str) -> Result<String, AssistantError>;
}
