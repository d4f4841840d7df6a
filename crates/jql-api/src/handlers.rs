//! API Handlers
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use jql_core::{
    DateRange, ExecutionContext, IntentSet, IssueLink, QueryError, QueryRequest, Sprint,
    StepRecord,
};
use jql_out::FollowUpContext;
use jql_sprint::{board_sprints, sprint_limit};
use jql_store::{HistoryEntry, Phrase};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::SharedState;

/// Entries returned by the history list.
pub const HISTORY_PAGE: usize = 20;
/// Entries echoed back with every search.
pub const SEARCH_HISTORY: usize = 10;

/// JSON error body: `{ "error": ..., "jql": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    jql: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            jql: String::new(),
        }
    }

    pub fn with_jql(mut self, jql: impl Into<String>) -> Self {
        self.jql = jql.into();
        self
    }

    fn invalid_json(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "request body rejected");
        Self::new(StatusCode::BAD_REQUEST, "invalid json")
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.detail())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.message });
        if !self.jql.is_empty() {
            body["jql"] = Value::String(self.jql);
        }
        (self.status, Json(body)).into_response()
    }
}

fn context(state: &SharedState) -> ExecutionContext {
    ExecutionContext::new().with_timeout(state.request_timeout)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn myself(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let ctx = context(&state);
    let tracker = state.pipeline.tracker();
    let me = ctx.call(tracker.myself()).await?.map_err(QueryError::from)?;
    Ok(Json(me))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

pub async fn projects(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let ctx = context(&state);
    let raw = ctx
        .call(state.pipeline.tracker().get("/rest/api/2/project"))
        .await?
        .map_err(QueryError::from)?;
    let all: Vec<ProjectSummary> = serde_json::from_value(raw).map_err(|err| {
        warn!(error = %err, "unexpected project list payload");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "cannot parse projects")
    })?;
    let visible = all
        .into_iter()
        .filter(|p| !state.blocklist.contains(&p.key.to_uppercase()))
        .collect();
    Ok(Json(visible))
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub jql: String,
    pub raw: Value,
    pub history: Vec<HistoryEntry>,
    #[serde(rename = "executedAt")]
    pub executed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<IssueLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepRecord>,
    #[serde(rename = "historyId", skip_serializing_if = "Option::is_none")]
    pub history_id: Option<String>,
    pub intents: IntentSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
}

pub async fn search(
    State(state): State<SharedState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = payload.map_err(ApiError::invalid_json)?;
    let ctx = context(&state);
    let started = Instant::now();
    let pipeline = &state.pipeline;

    let prepared = match pipeline.prepare(&ctx, &request).await {
        Ok(prepared) => prepared,
        Err(err) => {
            state.metrics.failed(err.class(), started.elapsed().as_secs_f64());
            return Err(ApiError::from(err).with_jql(request.explicit_query.trim()));
        }
    };
    let jql = prepared.query.clone();
    let outcome = match pipeline.execute(&ctx, &request, prepared).await {
        Ok(outcome) => outcome,
        Err(err) => {
            state.metrics.failed(err.class(), started.elapsed().as_secs_f64());
            return Err(ApiError::from(err).with_jql(jql));
        }
    };
    state
        .metrics
        .searched(&outcome.intents.labels(), started.elapsed().as_secs_f64());

    let Some(page) = outcome.page else {
        return Ok(Json(SearchResponse {
            jql: outcome.query,
            raw: json!([]),
            history: state.history.latest(SEARCH_HISTORY),
            executed_at: Utc::now(),
            analysis: None,
            total: None,
            issues: Vec::new(),
            steps: Vec::new(),
            history_id: None,
            intents: outcome.intents,
            range: outcome.range,
        }));
    };

    let steps = outcome.steps.into_inner();
    let entry = HistoryEntry::new(
        request.raw_text.as_str(),
        outcome.query.as_str(),
        request.effective_limit(),
    )
    .with_steps(steps.clone())
    .with_issues(outcome.links.clone())
    .with_analysis(outcome.analysis.clone());
    let executed_at = entry.created_at;
    let history_id = match state.history.append(entry.clone()) {
        Ok(()) => Some(entry.id),
        Err(err) => {
            warn!(trace_id = %ctx.trace_id, error = %err, "search not saved to history");
            None
        }
    };

    Ok(Json(SearchResponse {
        jql: outcome.query,
        raw: page.raw,
        history: state.history.latest(SEARCH_HISTORY),
        executed_at,
        analysis: outcome.analysis,
        total: Some(page.total),
        issues: outcome.links,
        steps,
        history_id,
        intents: outcome.intents,
        range: outcome.range,
    }))
}

pub async fn list_phrases(State(state): State<SharedState>) -> Json<Vec<Phrase>> {
    Json(state.phrases.list())
}

/// Phrases may arrive as objects or, from older clients, as bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PhraseInput {
    Text(String),
    Full(Phrase),
}

impl From<PhraseInput> for Phrase {
    fn from(input: PhraseInput) -> Self {
        match input {
            PhraseInput::Text(text) => Phrase::new(text),
            PhraseInput::Full(phrase) => phrase,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PhrasesPayload {
    #[serde(default)]
    pub phrases: Vec<PhraseInput>,
}

pub async fn replace_phrases(
    State(state): State<SharedState>,
    payload: Result<Json<PhrasesPayload>, JsonRejection>,
) -> Result<Json<Vec<Phrase>>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::invalid_json)?;
    let phrases = payload.phrases.into_iter().map(Phrase::from).collect();
    let stored = state.phrases.replace(phrases).map_err(|err| {
        warn!(error = %err, "phrases not saved");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "cannot save phrases")
    })?;
    Ok(Json(stored))
}

#[derive(Debug, Deserialize)]
pub struct SprintParams {
    pub limit: Option<String>,
}

pub async fn project_sprints(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Query(params): Query<SprintParams>,
) -> Result<Json<Vec<Sprint>>, ApiError> {
    let ctx = context(&state);
    let tracker = state.pipeline.tracker().as_ref();
    let limit = sprint_limit(params.limit.and_then(|l| l.trim().parse().ok()));
    let Some(board) = state
        .pipeline
        .boards()
        .board_for(tracker, &ctx, Some(key.as_str()))
        .await?
    else {
        debug!(project = %key, "no board, no sprints");
        return Ok(Json(Vec::new()));
    };
    Ok(Json(board_sprints(tracker, &ctx, board, limit).await?))
}

pub async fn history_list(State(state): State<SharedState>) -> Json<Vec<HistoryEntry>> {
    Json(state.history.latest(HISTORY_PAGE))
}

fn find_entry(state: &SharedState, id: &str) -> Result<HistoryEntry, ApiError> {
    state
        .history
        .get(id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "history entry not found"))
}

pub async fn history_item(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryEntry>, ApiError> {
    Ok(Json(find_entry(&state, &id)?))
}

#[derive(Debug, Deserialize)]
pub struct HistorySearchPayload {
    #[serde(default)]
    pub query: String,
}

pub async fn history_search(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<HistorySearchPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let entry = find_entry(&state, &id)?;
    let Json(payload) = payload.map_err(ApiError::invalid_json)?;
    let matches = entry.matching_issues(&payload.query);
    Ok(Json(json!({ "entry": entry, "matches": matches })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryActionPayload {
    #[serde(default)]
    pub command: String,
}

pub async fn history_action(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<HistoryActionPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let entry = find_entry(&state, &id)?;
    let Some(assistant) = state.pipeline.assistant() else {
        return Err(ApiError::new(StatusCode::NOT_IMPLEMENTED, "LLM not configured"));
    };
    let Json(payload) = payload.map_err(ApiError::invalid_json)?;
    let command = payload.command.trim();
    if command.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "command is required"));
    }

    let context_text = state.pipeline.texts().follow_up_context(&FollowUpContext {
        query: &entry.query,
        jql: &entry.jql,
        analysis: &entry.analysis,
        issues: &entry.issues,
        raw: entry.search_payload(),
    });
    let ctx = context(&state);
    let answer = ctx
        .run(assistant.follow_up(&context_text, command))
        .await
        .map_err(QueryError::from)?
        .map_err(|err| ApiError::new(StatusCode::BAD_GATEWAY, format!("llm: {}", err)))?;
    debug!(entry = %entry.id, "follow-up answered");
    Ok(Json(json!({ "result": answer })))
}

pub async fn metrics(State(state): State<SharedState>) -> Response {
    match state.metrics.encode() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
