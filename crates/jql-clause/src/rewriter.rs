//! Clause rewrites: override, default filters, date range injection.
//!
//! Every rewrite parses the query into a [`ClauseList`], edits the list and
//! renders it back, so the result never starts or ends with a connector.
use jql_core::DateRange;
use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::{ClauseKind, ClauseList};
use crate::parser::{group_body, parse_query};
use crate::serializer::render_query;
use crate::utils::quote_list;

/// Fields that carry date windows the resolver may rewrite.
const RANGE_FIELDS: [&str; 2] = ["created", "worklogDate"];

lazy_static! {
    static ref LITERAL_BOUND: Regex =
        Regex::new(r#"(?i)^(created|worklogDate)\s*(>=|<=)\s*"[0-9-]+"$"#).unwrap();
    static ref SYMBOLIC_START: Regex =
        Regex::new(r"(?i)^(created|worklogDate)\s*>=\s*startOf(?:Week|Month)\(\s*\)$").unwrap();
    static ref SYMBOLIC_END: Regex =
        Regex::new(r"(?i)^(created|worklogDate)\s*<=\s*endOf(?:Week|Month)\(\s*\)$").unwrap();
}

/// Replace every clause of `kind` with a single `kind in (...)` clause
/// appended with `AND`. An empty value list leaves the query unchanged.
pub fn override_clause(query: &str, kind: ClauseKind, values: &[String]) -> String {
    let list_text = quote_list(values);
    if list_text.is_empty() {
        return query.to_string();
    }
    let mut list = parse_query(query);
    list.remove_kind(kind);
    list.push_and(format!("{} in ({})", kind.field(), list_text));
    render_query(&list)
}

/// Add project/assignee filters only when the query does not mention the
/// field at all. Assignee is also held back when the query filters by
/// worklog author.
pub fn apply_default_filters(query: &str, projects: &[String], users: &[String]) -> String {
    let lower = query.to_lowercase();
    let mut list = parse_query(query);
    let mut changed = false;

    let projects = quote_list(projects);
    if !projects.is_empty()
        && !lower.contains("project in")
        && !lower.contains("project=")
        && !lower.contains("project ")
    {
        list.push_and(format!("project in ({})", projects));
        changed = true;
    }

    let users = quote_list(users);
    if !users.is_empty() && !lower.contains("assignee") && !lower.contains("worklogauthor") {
        list.push_and(format!("assignee in ({})", users));
        changed = true;
    }

    if changed {
        render_query(&list)
    } else {
        query.to_string()
    }
}

/// Remove literal `>= "date"` / `<= "date"` bounds on `field`.
pub fn strip_literal_range(query: &str, field: &str) -> String {
    let mut list = parse_query(query);
    strip_literal_bounds(&mut list, field);
    render_query(&list)
}

/// Drops matching bounds at any depth; a group left empty goes too.
/// Returns whether anything was removed.
fn strip_literal_bounds(list: &mut ClauseList, field: &str) -> bool {
    let mut changed = false;
    list.clauses.retain_mut(|clause| {
        if let Some(body) = group_body(&clause.text) {
            let mut nested = parse_query(body);
            if !strip_literal_bounds(&mut nested, field) {
                return true;
            }
            changed = true;
            if nested.is_empty() {
                return false;
            }
            clause.text = format!("({})", render_query(&nested));
            return true;
        }
        let keep = LITERAL_BOUND
            .captures(clause.text.trim())
            .map(|caps| !caps[1].eq_ignore_ascii_case(field))
            .unwrap_or(true);
        changed |= !keep;
        keep
    });
    changed
}

/// Turn `startOfWeek()`/`endOfMonth()` style bounds into literal dates,
/// inside parenthesized groups too. Returns whether any bound was replaced.
fn pin_symbolic_bounds(list: &mut ClauseList, start: &str, end: &str) -> bool {
    let mut replaced = false;
    for clause in list.clauses.iter_mut() {
        if let Some(body) = group_body(&clause.text) {
            let mut nested = parse_query(body);
            if pin_symbolic_bounds(&mut nested, start, end) {
                clause.text = format!("({})", render_query(&nested));
                replaced = true;
            }
            continue;
        }
        let text = clause.text.trim().to_string();
        if let Some(caps) = SYMBOLIC_START.captures(&text) {
            clause.text = format!("{} >= \"{}\"", &caps[1], start);
            replaced = true;
        } else if let Some(caps) = SYMBOLIC_END.captures(&text) {
            clause.text = format!("{} <= \"{}\"", &caps[1], end);
            replaced = true;
        }
    }
    replaced
}

/// Pin the query to `range`.
///
/// Earlier literal ranges on `created`/`worklogDate` are dropped, symbolic
/// week/month windows become quoted dates in place (parenthesized groups
/// included), and when there is no window to replace a pair is appended:
/// on `worklogDate` if the query filters by worklog author, on `created`
/// otherwise.
pub fn apply_date_range(query: &str, range: &DateRange) -> String {
    let start = range.start_literal();
    let end = range.end_literal();
    let mut list = parse_query(query);
    for field in RANGE_FIELDS {
        strip_literal_bounds(&mut list, field);
    }

    if !pin_symbolic_bounds(&mut list, &start, &end) {
        let field = if list.contains(ClauseKind::WorklogAuthor) {
            "worklogDate"
        } else {
            "created"
        };
        list.push_and(format!("{} >= \"{}\"", field, start));
        list.push_and(format!("{} <= \"{}\"", field, end));
    }
    render_query(&list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use jql_core::RangeSource;

    fn users(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            RangeSource::ExplicitId,
        )
        .unwrap()
    }

    #[test]
    fn test_override_single_assignee() {
        let out = override_clause("assignee = someone", ClauseKind::Assignee, &users(&["alice", "bob"]));
        assert_eq!(out, r#"assignee in ("alice","bob")"#);
    }

    #[test]
    fn test_override_removes_preceding_connector() {
        let out = override_clause(
            "status = Open AND reporter = currentUser() ORDER BY created DESC",
            ClauseKind::Reporter,
            &users(&["a.ivanov"]),
        );
        assert_eq!(out, r#"status = Open AND reporter in ("a.ivanov") ORDER BY created DESC"#);
    }

    #[test]
    fn test_override_appends_when_absent() {
        let out = override_clause("status = Open", ClauseKind::Project, &users(&["CE", "WEB"]));
        assert_eq!(out, r#"status = Open AND project in ("CE","WEB")"#);
    }

    #[test]
    fn test_override_empty_values_is_noop() {
        let query = "assignee = someone AND";
        assert_eq!(override_clause(query, ClauseKind::Assignee, &[]), query);
        assert_eq!(override_clause(query, ClauseKind::Assignee, &users(&[" "])), query);
    }

    #[test]
    fn test_override_twice_single_clause() {
        let values = users(&["alice"]);
        let once = override_clause("assignee in (x, y) AND status = Open", ClauseKind::Assignee, &values);
        let twice = override_clause(&once, ClauseKind::Assignee, &values);
        assert_eq!(once, twice);
        assert_eq!(parse_query(&twice).count(ClauseKind::Assignee), 1);
    }

    #[test]
    fn test_override_escapes_values() {
        let out = override_clause("", ClauseKind::WorklogAuthor, &users(&[r#"o"brien"#]));
        assert_eq!(out, r#"worklogAuthor in ("o\"brien")"#);
    }

    #[test]
    fn test_default_filters_respect_existing_fields() {
        let projects = users(&["CE"]);
        let people = users(&["alice"]);
        assert_eq!(
            apply_default_filters("status = Open", &projects, &people),
            r#"status = Open AND project in ("CE") AND assignee in ("alice")"#
        );
        assert_eq!(
            apply_default_filters("project = CE AND worklogAuthor = currentUser()", &projects, &people),
            "project = CE AND worklogAuthor = currentUser()"
        );
        assert_eq!(apply_default_filters("status = Open", &[], &[]), "status = Open");
    }

    #[test]
    fn test_symbolic_week_window_replaced() {
        let query = "worklogDate >= startOfWeek() AND worklogDate <= endOfWeek() AND worklogAuthor = currentUser()";
        let out = apply_date_range(query, &range((2025, 1, 2), (2025, 1, 8)));
        assert_eq!(
            out,
            r#"worklogDate >= "2025-01-02" AND worklogDate <= "2025-01-08" AND worklogAuthor = currentUser()"#
        );
    }

    #[test]
    fn test_reapplying_keeps_one_pair() {
        let query = "worklogDate >= startOfWeek() AND worklogDate <= endOfWeek() AND worklogAuthor = currentUser()";
        let first = apply_date_range(query, &range((2025, 1, 2), (2025, 1, 8)));
        let second = apply_date_range(&first, &range((2025, 1, 9), (2025, 1, 15)));
        assert_eq!(second.matches("worklogDate >=").count(), 1);
        assert_eq!(second.matches("worklogDate <=").count(), 1);
        assert!(second.contains(r#""2025-01-09""#));
        assert!(!second.contains("2025-01-02"));
    }

    #[test]
    fn test_symbolic_window_inside_group_replaced() {
        let query = "project = CE AND (worklogDate >= startOfWeek() AND worklogDate <= endOfWeek()) AND worklogAuthor = currentUser()";
        let out = apply_date_range(query, &range((2025, 1, 2), (2025, 1, 8)));
        assert!(!out.contains("startOfWeek()"));
        assert!(!out.contains("endOfWeek()"));
        assert_eq!(
            out,
            r#"project = CE AND (worklogDate >= "2025-01-02" AND worklogDate <= "2025-01-08") AND worklogAuthor = currentUser()"#
        );
    }

    #[test]
    fn test_nested_literal_range_stripped() {
        let query = r#"status = Open AND ((created >= "2024-12-01" AND created <= "2024-12-31")) AND (labels = ui OR labels = ux)"#;
        let out = apply_date_range(query, &range((2025, 1, 2), (2025, 1, 8)));
        assert_eq!(
            out,
            r#"status = Open AND (labels = ui OR labels = ux) AND created >= "2025-01-02" AND created <= "2025-01-08""#
        );
    }

    #[test]
    fn test_append_created_range_without_worklog_author() {
        let out = apply_date_range("issuetype = Bug", &range((2025, 1, 2), (2025, 1, 8)));
        assert_eq!(out, r#"issuetype = Bug AND created >= "2025-01-02" AND created <= "2025-01-08""#);
    }

    #[test]
    fn test_append_worklog_range_with_author() {
        let out = apply_date_range(r#"worklogAuthor in ("a")"#, &range((2025, 1, 2), (2025, 1, 8)));
        assert!(out.ends_with(r#"worklogDate >= "2025-01-02" AND worklogDate <= "2025-01-08""#));
    }

    #[test]
    fn test_strip_literal_range_only_named_field() {
        let query = r#"created >= "2025-01-01" AND created <= "2025-01-07" AND worklogDate >= "2025-01-01""#;
        assert_eq!(strip_literal_range(query, "created"), r#"worklogDate >= "2025-01-01""#);
    }
}
