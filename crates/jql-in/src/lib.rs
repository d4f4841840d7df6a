//! JQL-IN: natural-language request to base JQL.
//!
//! This crate classifies a request into intents and synthesizes the base
//! query the rewriter then scopes to projects, people and dates.
//!
//! # Example
//!
//! ```ignore
//! use jql_in::{interpret, KeywordCatalog};
//! use jql_core::QueryRequest;
//!
//! let catalog = KeywordCatalog::builtin();
//! let request = QueryRequest::new("сколько времени я списал за месяц");
//! let result = interpret(&request, None, &catalog).unwrap();
//! assert!(result.intents.is_worklog);
//! ```

pub mod catalog;
pub mod classifier;
pub mod normalizer;
pub mod synthesizer;
pub mod title;

pub use catalog::KeywordCatalog;
pub use classifier::{classify, looks_like_query, parse_sprint_number, wants_week_window};
pub use synthesizer::{clean_suggestion, heuristic_query, synthesize, title_query};
pub use title::extract_title;

use jql_core::{IntentSet, QueryError, QueryRequest};
use serde::Serialize;

/// Base query and intents for one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    /// Title directive value, when the request named an issue title
    pub title: Option<String>,
    /// Base query before clause rewrites
    pub query: String,
    pub intents: IntentSet,
}

/// Whether a model suggestion would be used for this request. Explicit
/// queries and title directives take precedence over it.
pub fn wants_suggestion(request: &QueryRequest, catalog: &KeywordCatalog) -> bool {
    request.explicit_query.trim().is_empty() && extract_title(&request.raw_text, catalog).is_none()
}

/// Synthesize the base query and classify the request against it.
pub fn interpret(
    request: &QueryRequest,
    suggestion: Option<&str>,
    catalog: &KeywordCatalog,
) -> Result<Interpretation, QueryError> {
    let title = extract_title(&request.raw_text, catalog);
    let query = synthesize(request, title.as_deref(), suggestion, catalog)?;
    let intents = classify(&request.raw_text, &query, catalog);
    Ok(Interpretation {
        title,
        query,
        intents,
    })
}
