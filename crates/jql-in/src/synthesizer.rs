//! Query synthesis.
//!
//! Precedence: explicit query → title directive → model suggestion →
//! keyword heuristic.

use jql_clause::escape_quotes;
use jql_core::{QueryError, QueryRequest};

use crate::catalog::{contains_any, KeywordCatalog};
use crate::classifier::{looks_like_query, wants_week_window};
use crate::normalizer::normalize;

/// Build the base query for a request.
pub fn synthesize(
    request: &QueryRequest,
    title: Option<&str>,
    suggestion: Option<&str>,
    catalog: &KeywordCatalog,
) -> Result<String, QueryError> {
    let explicit = request.explicit_query.trim();
    let query = if !explicit.is_empty() {
        explicit.to_string()
    } else if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        title_query(title)
    } else {
        match suggestion.map(clean_suggestion).filter(|s| !s.is_empty()) {
            Some(suggested) => suggested,
            None => heuristic_query(&request.raw_text, catalog),
        }
    };

    if query.trim().is_empty() {
        return Err(QueryError::EmptyQuery);
    }
    Ok(query)
}

/// Exact-phrase summary search.
pub fn title_query(title: &str) -> String {
    format!("summary ~ \"\\\"{}\\\"\"", escape_quotes(title.trim()))
}

/// Keyword fallback used when nothing better is available.
pub fn heuristic_query(raw_text: &str, catalog: &KeywordCatalog) -> String {
    let raw = raw_text.trim();
    if raw.is_empty() {
        return String::new();
    }
    let text = normalize(raw);
    let window = if wants_week_window(raw, catalog) {
        "Week"
    } else {
        "Month"
    };

    if contains_any(&text, &catalog.bug) {
        return format!(
            "created >= startOf{w}() AND created <= endOf{w}() AND issuetype = Bug AND reporter = currentUser()",
            w = window
        );
    }
    if contains_any(&text, &catalog.worklog) {
        return format!(
            "worklogDate >= startOf{w}() AND worklogDate <= endOf{w}() AND worklogAuthor = currentUser()",
            w = window
        );
    }
    if looks_like_query(raw, catalog) {
        return raw.to_string();
    }
    format!("text ~ \"{}\"", escape_quotes(raw))
}

/// Strip code fences and a leading `JQL`/`SQL` label from a model answer.
pub fn clean_suggestion(suggestion: &str) -> String {
    let mut out = suggestion.trim().trim_matches('`').trim();
    for label in ["jql", "sql"] {
        if let Some(head) = out.get(..label.len()) {
            let rest = &out[label.len()..];
            let separated = rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == ':');
            if head.eq_ignore_ascii_case(label) && separated {
                out = rest.trim_start_matches(':').trim();
                break;
            }
        }
    }
    out.to_string()
}
