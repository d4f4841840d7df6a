use chrono::{Duration, TimeZone, Utc};
use jql_core::IssueLink;
use jql_store::{HistoryEntry, HistoryStore, Phrase, PhraseStore};

fn entry(n: i64) -> HistoryEntry {
    let at = Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap() + Duration::minutes(n);
    HistoryEntry::new(format!("query {}", n), format!("key = CE-{}", n), 50).at(at)
}

#[test]
fn test_history_newest_first_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("history.json");
    let store = HistoryStore::open(&path).with_limit(3);
    for n in 0..5 {
        store.append(entry(n)).unwrap();
    }
    let latest: Vec<String> = store.latest(0).into_iter().map(|e| e.query).collect();
    assert_eq!(latest, vec!["query 4", "query 3", "query 2"]);
    assert_eq!(store.latest(2).len(), 2);

    let reopened = HistoryStore::open(&path);
    assert_eq!(reopened.len(), 3);
    assert_eq!(reopened.latest(1)[0].query, "query 4");
}

#[test]
fn test_history_get_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::open(dir.path().join("history.json"));
    let first = entry(1).with_issues(vec![IssueLink {
        key: "CE-1".into(),
        title: "Login".into(),
        url: "https://jira.example.com/browse/CE-1".into(),
    }]);
    let id = first.id.clone();
    store.append(first).unwrap();
    store.append(entry(2)).unwrap();

    let found = store.get(&id).unwrap();
    assert_eq!(found.issues[0].key, "CE-1");
    assert!(store.get("missing").is_none());
}

#[test]
fn test_corrupt_history_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = HistoryStore::open(&path);
    assert!(store.is_empty());
    store.append(entry(1)).unwrap();
    assert_eq!(HistoryStore::open(&path).len(), 1);
}

#[test]
fn test_legacy_phrases_converted_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("phrases.json");
    std::fs::write(&path, r#"["мои баги", "  ", "worklog за месяц"]"#).unwrap();

    let store = PhraseStore::open(&path);
    assert_eq!(
        store.list(),
        vec![Phrase::new("мои баги"), Phrase::new("worklog за месяц")]
    );

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk[0]["text"], "мои баги");
}

#[test]
fn test_phrases_replace_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("phrases.json");
    let store = PhraseStore::open(&path);
    assert!(store.list().is_empty());

    let stored = store
        .replace(vec![
            Phrase::new("a").described("first"),
            Phrase::new(" a "),
            Phrase::new("b"),
        ])
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(PhraseStore::open(&path).list(), stored);
}
