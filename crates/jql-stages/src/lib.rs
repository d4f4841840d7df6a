//! JQL Stages: the query pipeline.
//!
//! # Pipeline Flow
//!
//! ```text
//! Request → suggestion? → interpret → sprint range? → scope → clean
//!                                                              ↓
//!        Outcome ← steps ← analysis ← worklog? ← detail? ← search
//! ```
//!
//! Every external call is raced against the request's deadline and
//! cancellation. Only the search itself and interruption fail a request;
//! model calls, sprint lookups, issue details and worklog aggregation
//! degrade to "not available".

mod pipeline;
mod scope;

pub use pipeline::{
    issue_detail_path, search_fields, sprint_scoped, PipelineOutcome, PreparedQuery,
    QueryPipeline,
};
pub use scope::scope_query;
