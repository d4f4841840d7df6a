//! Who and where: scoping the base query to the selected projects and people.
use jql_clause::{apply_default_filters, clean_query, override_clause, ClauseKind};
use jql_core::IntentSet;

/// Apply the selected projects and users to `query`.
///
/// - worklog requests with users: users become worklog authors (and
///   reporters when the request is also about bugs); no assignee filter;
/// - bug requests: users become reporters; no assignee filter;
/// - everything else: users become assignees.
///
/// Projects replace any project clause in every case. The result is cleaned.
pub fn scope_query(query: &str, intents: IntentSet, projects: &[String], users: &[String]) -> String {
    let scoped = if intents.is_worklog && !users.is_empty() {
        let mut q = override_clause(query, ClauseKind::WorklogAuthor, users);
        if intents.is_bug {
            q = override_clause(&q, ClauseKind::Reporter, users);
        }
        q = override_clause(&q, ClauseKind::Project, projects);
        apply_default_filters(&q, &[], &[])
    } else if intents.is_bug {
        let q = override_clause(query, ClauseKind::Reporter, users);
        let q = override_clause(&q, ClauseKind::Project, projects);
        apply_default_filters(&q, &[], &[])
    } else {
        let q = override_clause(query, ClauseKind::Project, projects);
        let q = override_clause(&q, ClauseKind::Assignee, users);
        apply_default_filters(&q, &[], users)
    };
    clean_query(&scoped)
}
