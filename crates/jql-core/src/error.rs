//! Unified Error Model
use thiserror::Error;

use crate::capability::{AssistantError, TrackerError};
use crate::context::Interrupted;
use crate::ERROR_BODY_LIMIT;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("QUERY/EMPTY: could not derive a query from the request")]
    EmptyQuery,

    #[error("QUERY/INVALID: {0}")]
    Validation(String),

    #[error("TRACKER/{status}: {message}")]
    ExternalService {
        status: u16,
        message: String,
        body: String,
    },

    #[error("WORKLOG/{0}")]
    Aggregation(String),

    #[error("ASSISTANT/{0}")]
    Assistant(String),

    #[error("CANCELLED/{0}")]
    Cancelled(String),
}

impl QueryError {
    /// HTTP status class the error maps to when surfaced to a caller.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::EmptyQuery | Self::Validation(_) => 400,
            Self::ExternalService { .. } | Self::Assistant(_) | Self::Aggregation(_) => 502,
            Self::Cancelled(_) => 504,
        }
    }

    /// Short label used for metrics and logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "empty_query",
            Self::Validation(_) => "validation",
            Self::ExternalService { .. } => "external_service",
            Self::Aggregation(_) => "aggregation",
            Self::Assistant(_) => "assistant",
            Self::Cancelled(_) => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Message with the upstream body excerpt appended, as shown to users.
    pub fn detail(&self) -> String {
        match self {
            Self::ExternalService { body, .. } if !body.is_empty() => {
                format!("{}: {}", self, body)
            }
            _ => self.to_string(),
        }
    }
}

impl From<TrackerError> for QueryError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Status { status, message, body } => Self::ExternalService {
                status,
                message,
                body: truncate_body(&body, ERROR_BODY_LIMIT),
            },
            TrackerError::Transport(msg) => Self::ExternalService {
                status: 502,
                message: msg,
                body: String::new(),
            },
            TrackerError::Decode(msg) => Self::ExternalService {
                status: 502,
                message: format!("unreadable tracker payload: {}", msg),
                body: String::new(),
            },
            TrackerError::Cancelled(reason) => Self::Cancelled(reason),
        }
    }
}

impl From<AssistantError> for QueryError {
    fn from(err: AssistantError) -> Self {
        Self::Assistant(err.to_string())
    }
}

impl From<Interrupted> for QueryError {
    fn from(err: Interrupted) -> Self {
        Self::Cancelled(err.to_string())
    }
}

/// Cut a response body to `limit` bytes on a char boundary, marking the cut.
pub fn truncate_body(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut cut = limit;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &body[..cut])
}
