//! Intent classification.
//!
//! Intents are independent keyword signals read from the request text and
//! the in-progress query. Classification is pure: same inputs, same flags.

use jql_core::IntentSet;

use crate::catalog::{contains_any, KeywordCatalog};
use crate::normalizer::{normalize, signal_text};

/// Classify a request into its intent flags.
pub fn classify(raw_text: &str, query: &str, catalog: &KeywordCatalog) -> IntentSet {
    let text = signal_text(raw_text, query);
    IntentSet {
        is_bug: contains_any(&text, &catalog.bug),
        is_worklog: contains_any(&text, &catalog.worklog),
        is_sprint_scoped: contains_any(&text, &catalog.sprint),
    }
}

/// Whether the request talks about a week-long window rather than a month.
pub fn wants_week_window(raw_text: &str, catalog: &KeywordCatalog) -> bool {
    contains_any(&normalize(raw_text), &catalog.week_window)
}

/// Whether the request already reads like partial query syntax.
pub fn looks_like_query(raw_text: &str, catalog: &KeywordCatalog) -> bool {
    contains_any(&normalize(raw_text), &catalog.query_syntax_markers)
}

/// Sprint number written next to a sprint word of the catalog
/// ("sprint 42", "42 спринт").
pub fn parse_sprint_number(text: &str, catalog: &KeywordCatalog) -> Option<u64> {
    let caps = catalog.sprint_number.as_ref()?.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> KeywordCatalog {
        KeywordCatalog::builtin()
    }

    #[test]
    fn test_bug_intent() {
        let intents = classify("Покажи баги, заведенные мной", "", &catalog());
        assert!(intents.is_bug);
        assert!(!intents.is_worklog);
        assert!(!intents.is_sprint_scoped);
    }

    #[test]
    fn test_worklog_intent() {
        let intents = classify("сколько времени я списал за месяц", "", &catalog());
        assert!(intents.is_worklog);
        assert!(!intents.is_bug);
    }

    #[test]
    fn test_intents_are_independent() {
        let intents = classify("worklog on bugs this sprint", "", &catalog());
        assert!(intents.is_bug && intents.is_worklog && intents.is_sprint_scoped);
    }

    #[test]
    fn test_query_contributes_signals() {
        let intents = classify("что у меня", "issuetype = Bug", &catalog());
        assert!(intents.is_bug);
    }

    #[test]
    fn test_week_window_and_syntax() {
        assert!(wants_week_window("за эту неделю", &catalog()));
        assert!(wants_week_window("this Sprint", &catalog()));
        assert!(!wants_week_window("за месяц", &catalog()));
        assert!(looks_like_query("project = CE AND status = Open", &catalog()));
        assert!(!looks_like_query("login page is slow", &catalog()));
    }

    #[test]
    fn test_sprint_number() {
        let catalog = catalog();
        assert_eq!(parse_sprint_number("задачи спринта 42", &catalog), None);
        assert_eq!(parse_sprint_number("спринт 42", &catalog), Some(42));
        assert_eq!(parse_sprint_number("Sprint42 bugs", &catalog), Some(42));
        assert_eq!(parse_sprint_number("12 спринт", &catalog), Some(12));
        assert_eq!(parse_sprint_number("sprint 0", &catalog), None);
        assert_eq!(parse_sprint_number("без номера", &catalog), None);
    }

    #[test]
    fn test_sprint_number_uses_catalog_words() {
        let catalog = KeywordCatalog::from_yaml(
            r#"
version: "1.0"
locales:
  de:
    sprint: [Sprint, Iteration]
"#,
        )
        .unwrap();
        assert_eq!(parse_sprint_number("Fehler in Iteration 7", &catalog), Some(7));
        assert_eq!(parse_sprint_number("3 iteration", &catalog), Some(3));
        assert_eq!(parse_sprint_number("спринт 42", &catalog), None);

        let no_sprint_words = KeywordCatalog::from_yaml("version: \"1.0\"\nlocales:\n  x:\n    bug: [bug]\n").unwrap();
        assert_eq!(parse_sprint_number("sprint 42", &no_sprint_words), None);
    }

    #[test]
    fn test_english_worklog_wording() {
        let intents = classify("how many hours I logged this month", "", &catalog());
        assert!(intents.is_worklog);
        assert!(!intents.is_bug);
    }
}
