use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use jql_api::{create_app, AppState};
use jql_core::testing::{ScriptedAssistant, StaticTracker};
use jql_core::{IssueTracker, QueryAssistant, Sprint, SprintState, TrackerError};
use jql_out::ResponseTexts;
use jql_sprint::BoardDirectory;
use jql_stages::QueryPipeline;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(
    tracker: StaticTracker,
    assistant: Option<ScriptedAssistant>,
    boards: BoardDirectory,
    data_dir: &Path,
) -> Router {
    let tracker: Arc<dyn IssueTracker> = Arc::new(tracker);
    let assistant = assistant.map(|a| Arc::new(a) as Arc<dyn QueryAssistant>);
    let pipeline = QueryPipeline::new(tracker, Arc::new(ResponseTexts::builtin().unwrap()))
        .with_assistant(assistant)
        .with_boards(boards);
    let state = AppState::new(pipeline, data_dir).unwrap();
    create_app(Arc::new(state), None)
}

fn basic(tracker: StaticTracker, data_dir: &Path) -> Router {
    app(tracker, None, BoardDirectory::new(), data_dir)
}

fn issue(key: &str, summary: &str) -> Value {
    json!({ "key": key, "fields": { "summary": summary } })
}

async fn send(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Body::empty()).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Body::from(body.to_string())).await
}

#[tokio::test]
async fn test_health_and_myself() {
    let dir = tempfile::tempdir().unwrap();
    let app = basic(StaticTracker::new("alice"), dir.path());
    assert_eq!(get(&app, "/api/health").await, (StatusCode::OK, json!("ok")));
    assert_eq!(
        get(&app, "/api/myself").await,
        (StatusCode::OK, json!({ "name": "alice" }))
    );
}

#[tokio::test]
async fn test_projects_hide_blocklisted_keys() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = StaticTracker::new("alice").with_path(
        "/rest/api/2/project",
        json!([
            { "key": "CE", "name": "Simulator" },
            { "key": "SEC", "name": "Security" },
        ]),
    );
    let (status, body) = get(&basic(tracker, dir.path()), "/api/projects").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "key": "CE", "name": "Simulator" }]));
}

#[tokio::test]
async fn test_search_is_saved_and_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = StaticTracker::new("alice")
        .with_issues(vec![issue("CE-1", "Login fails"), issue("CE-2", "Export")]);
    let app = basic(tracker, dir.path());

    let (status, body) = post(&app, "/api/search", json!({ "jql": "project = CE" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jql"], "project = CE");
    assert_eq!(body["total"], 2);
    assert_eq!(body["issues"][0]["key"], "CE-1");
    assert_eq!(body["history"].as_array().unwrap().len(), 1);
    assert_eq!(body["intents"], json!({ "bug": false, "worklog": false, "sprint": false }));
    let id = body["historyId"].as_str().unwrap().to_string();

    let (status, list) = get(&app, "/api/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], id.as_str());

    let (status, entry) = get(&app, &format!("/api/history/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["jql"], "project = CE");

    let (status, found) = post(
        &app,
        &format!("/api/history/{}/search", id),
        json!({ "query": "LOGIN" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["matches"].as_array().unwrap().len(), 1);
    assert_eq!(found["matches"][0]["key"], "CE-1");
    assert_eq!(found["entry"]["id"], id.as_str());

    assert_eq!(get(&app, "/api/history/nope").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dry_run_is_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = StaticTracker::new("alice");
    let app = basic(tracker, dir.path());
    let (status, body) = post(
        &app,
        "/api/search",
        json!({ "jql": "project = CE", "dryRun": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jql"], "project = CE");
    assert_eq!(body["raw"], json!([]));
    assert!(body.get("historyId").is_none());
    assert_eq!(get(&app, "/api/history").await.1, json!([]));
}

#[tokio::test]
async fn test_search_errors() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = StaticTracker::new("alice").failing_search(TrackerError::Status {
        status: 400,
        message: "jira: 400 Bad Request".into(),
        body: "Field 'foo' does not exist".into(),
    });
    let app = basic(tracker, dir.path());

    let (status, body) = post(&app, "/api/search", json!({ "jql": "foo = bar" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["jql"], "foo = bar");
    assert!(body["error"].as_str().unwrap().contains("Field 'foo' does not exist"));

    let (status, body) = post(&app, "/api/search", json!({ "query": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("QUERY/EMPTY"));

    let (status, body) = send(&app, "POST", "/api/search", Body::from("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid json" }));

    let (_, metrics) = get(&app, "/metrics").await;
    let metrics = metrics.as_str().unwrap().to_string();
    assert!(metrics.contains("jql_pipeline_failures_total{class=\"external_service\"} 1"));
    assert!(metrics.contains("jql_pipeline_failures_total{class=\"empty_query\"} 1"));
}

#[tokio::test]
async fn test_follow_up_actions() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = || StaticTracker::new("alice").with_issues(vec![issue("CE-1", "Login fails")]);

    let without = basic(tracker(), dir.path());
    let (_, body) = post(&without, "/api/search", json!({ "jql": "project = CE" })).await;
    let id = body["historyId"].as_str().unwrap().to_string();
    let (status, body) = post(
        &without,
        &format!("/api/history/{}/action", id),
        json!({ "command": "summarize" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["error"], "LLM not configured");

    let assistant = ScriptedAssistant {
        answer: Some("One login issue".to_string()),
        ..ScriptedAssistant::default()
    };
    let with = app(tracker(), Some(assistant), BoardDirectory::new(), dir.path());
    let uri = format!("/api/history/{}/action", id);
    let (status, body) = post(&with, &uri, json!({ "command": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "command is required");

    let (status, body) = post(&with, &uri, json!({ "command": "summarize" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "One login issue" }));

    let silent = app(
        tracker(),
        Some(ScriptedAssistant::default()),
        BoardDirectory::new(),
        dir.path(),
    );
    let (status, body) = post(&silent, &uri, json!({ "command": "summarize" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("llm: "));
}

#[tokio::test]
async fn test_phrases_accept_strings_and_objects() {
    let dir = tempfile::tempdir().unwrap();
    let app = basic(StaticTracker::new("alice"), dir.path());
    assert_eq!(get(&app, "/api/phrases").await.1, json!([]));

    let (status, body) = post(
        &app,
        "/api/phrases",
        json!({ "phrases": [
            "мои баги",
            { "text": "worklog", "description": "за месяц" },
            " мои баги ",
            ""
        ] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let expected = json!([
        { "text": "мои баги" },
        { "text": "worklog", "description": "за месяц" }
    ]);
    assert_eq!(body, expected);
    assert_eq!(get(&app, "/api/phrases").await.1, expected);
}

#[tokio::test]
async fn test_project_sprints() {
    let dir = tempfile::tempdir().unwrap();
    let sprint = |id: u64, end: &str| Sprint {
        id,
        name: format!("Sprint {}", id),
        state: "future".to_string(),
        end_date: Some(end.to_string()),
        ..Sprint::default()
    };
    let tracker = StaticTracker::new("alice")
        .with_sprints(209, SprintState::Active, vec![sprint(1, "2025-01-08T00:00:00Z")])
        .with_sprints(209, SprintState::Future, vec![sprint(2, "2025-01-15T00:00:00Z")]);
    let app = app(
        tracker,
        None,
        BoardDirectory::new().with_board("CE", 209),
        dir.path(),
    );

    let (status, body) = get(&app, "/api/projects/CE/sprints?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], 2);

    let (status, body) = get(&app, "/api/projects/OPS/sprints").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
