use std::net::SocketAddr;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use jql_assistant::{AssistantSettings, OpenAiAssistant};
use jql_core::{AssistantError, QueryAssistant};
use serde_json::{json, Value};

/// Echoes the request back inside the completion so tests can inspect it.
async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let content = json!({ "auth": auth, "request": body }).to_string();
    Json(json!({ "choices": [{ "message": { "role": "assistant", "content": format!("  {}\n", content) } }] }))
}

async fn empty() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

async fn overloaded() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "overloaded")
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn assistant(app: Router) -> OpenAiAssistant {
    let addr = serve(app).await;
    OpenAiAssistant::from_settings(
        AssistantSettings::new("sk-test")
            .with_model("local-model")
            .with_base_url(&format!("http://{}/v1/", addr)),
    )
    .unwrap()
    .unwrap()
}

#[tokio::test]
async fn test_derive_sends_prompt_and_limits() {
    let a = assistant(Router::new().route("/v1/chat/completions", post(echo))).await;
    let out = a.derive_query(" мои задачи ").await.unwrap();
    let echoed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(echoed["auth"], "Bearer sk-test");
    let req = &echoed["request"];
    assert_eq!(req["model"], "local-model");
    assert_eq!(req["max_tokens"], 120);
    assert_eq!(req["messages"][0]["role"], "system");
    assert_eq!(req["messages"][1]["content"], "User request: мои задачи");
}

#[tokio::test]
async fn test_summarize_carries_query_and_payload() {
    let a = assistant(Router::new().route("/v1/chat/completions", post(echo))).await;
    let payload = json!({ "total": 1, "issues": [{ "key": "CE-1" }] });
    let out = a.summarize("bugs", "project = CE", &payload).await.unwrap();
    let echoed: Value = serde_json::from_str(&out).unwrap();
    let user = echoed["request"]["messages"][1]["content"].as_str().unwrap();
    assert!(user.starts_with("User request: bugs\nExecuted JQL: project = CE\nJira raw JSON: "));
    assert!(user.contains("CE-1"));
    assert_eq!(echoed["request"]["max_tokens"], 400);
}

#[tokio::test]
async fn test_follow_up_prompt() {
    let a = assistant(Router::new().route("/v1/chat/completions", post(echo))).await;
    let out = a.follow_up("Executed JQL: x", "write a test plan").await.unwrap();
    let echoed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        echoed["request"]["messages"][1]["content"],
        "Context:\nExecuted JQL: x\n\nCommand: write a test plan"
    );
}

#[tokio::test]
async fn test_no_choices() {
    let a = assistant(Router::new().route("/v1/chat/completions", post(empty))).await;
    assert_eq!(a.derive_query("x").await, Err(AssistantError::NoChoices));
}

#[tokio::test]
async fn test_upstream_failure_is_request_error() {
    let a = assistant(Router::new().route("/v1/chat/completions", post(overloaded))).await;
    match a.derive_query("x").await {
        Err(AssistantError::Request(msg)) => assert!(msg.contains("503")),
        other => panic!("unexpected {:?}", other),
    }
}
