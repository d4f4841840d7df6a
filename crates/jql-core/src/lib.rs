//! JQL Core: data model, error taxonomy, execution context and the
//! capabilities the pipeline consumes.
//!
//! Everything that talks to the outside world (issue tracker, generative
//! model) is reached through the traits in [`capability`], so the
//! interpretation crates stay pure and testable.

pub mod capability;
pub mod context;
pub mod data_model;
pub mod error;
pub mod stage;
pub mod time;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use capability::{AssistantError, IssueTracker, QueryAssistant, SprintState, TrackerError};
pub use context::{ExecutionContext, Interrupted};
pub use data_model::{
    Board, DateRange, IntentSet, IssueLink, QueryRequest, RangeSource, SearchPage, Sprint,
    WorklogAuthor, WorklogEntry,
};
pub use error::QueryError;
pub use stage::{StepLog, StepRecord, StepStatus};

/// Upper bound on `maxResults` accepted from callers.
pub const MAX_RESULTS_CAP: u32 = 300;

/// Longest upstream body excerpt carried in an error.
pub const ERROR_BODY_LIMIT: usize = 400;
