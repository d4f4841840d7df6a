//! JQL API: HTTP surface over the query pipeline, history and phrases.
pub mod config;
pub mod handlers;
pub mod logging;
pub mod meta;
pub mod metrics;
pub mod middleware;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use jql_assistant::{AssistantSettings, OpenAiAssistant};
use jql_core::QueryAssistant;
use jql_in::KeywordCatalog;
use jql_out::ResponseTexts;
use jql_stages::QueryPipeline;
use jql_store::{HistoryStore, PhraseStore};
use jql_tracker::{JiraClient, TrackerConfig};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{Config, DEFAULT_BLOCKLIST, DEFAULT_REQUEST_TIMEOUT};
use crate::metrics::Metrics;

pub struct AppState {
    pub pipeline: QueryPipeline,
    pub history: HistoryStore,
    pub phrases: PhraseStore,
    pub metrics: Metrics,
    /// Upper-case project keys hidden from `/api/projects`.
    pub blocklist: HashSet<String>,
    pub request_timeout: Duration,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Stores live in `data_dir` as `history.json` and `phrases.json`.
    pub fn new(pipeline: QueryPipeline, data_dir: &Path) -> Result<Self, prometheus::Error> {
        Ok(Self {
            pipeline,
            history: HistoryStore::open(data_dir.join("history.json")),
            phrases: PhraseStore::open(data_dir.join("phrases.json")),
            metrics: Metrics::new()?,
            blocklist: DEFAULT_BLOCKLIST.iter().map(|k| k.to_string()).collect(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_blocklist(mut self, keys: &[String]) -> Self {
        self.blocklist = keys.iter().map(|k| k.trim().to_uppercase()).collect();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

pub fn jira_client(config: &Config) -> anyhow::Result<JiraClient> {
    JiraClient::new(TrackerConfig::new(
        config.jira_host.as_str(),
        config.jira_user.as_str(),
        config.jira_password.as_str(),
    ))
    .context("jira client")
}

/// Wire the tracker, the optional assistant and the text resources from
/// configuration.
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let tracker = jira_client(config)?;

    let texts = match &config.templates_path {
        Some(path) => ResponseTexts::load(path),
        None => ResponseTexts::builtin(),
    }
    .context("response templates")?;

    let catalog = match &config.keywords_path {
        Some(path) => KeywordCatalog::load(path).map_err(anyhow::Error::msg)?,
        None => KeywordCatalog::builtin(),
    };

    let settings = AssistantSettings::new(config.openai_api_key.as_str())
        .with_model(&config.openai_model)
        .with_base_url(&config.openai_base_url)
        .with_timeout(config.request_timeout);
    let assistant = OpenAiAssistant::from_settings(settings)
        .context("assistant client")?
        .map(|a| Arc::new(a) as Arc<dyn QueryAssistant>);

    let pipeline = QueryPipeline::new(Arc::new(tracker), Arc::new(texts))
        .with_assistant(assistant)
        .with_catalog(Arc::new(catalog))
        .with_boards(config.boards.clone())
        .with_fallback_weekday(config.fallback_weekday);

    Ok(AppState::new(pipeline, &config.data_dir)
        .context("metrics registry")?
        .with_blocklist(&config.project_blocklist)
        .with_request_timeout(config.request_timeout))
}

/// Routes plus middleware. Without `web_dir` unknown paths are plain 404s.
pub fn create_app(state: SharedState, web_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/myself", get(handlers::myself))
        .route("/api/projects", get(handlers::projects))
        .route("/api/projects/{key}/sprints", get(handlers::project_sprints))
        .route("/api/search", post(handlers::search))
        .route(
            "/api/phrases",
            get(handlers::list_phrases).post(handlers::replace_phrases),
        )
        .route("/api/history", get(handlers::history_list))
        .route("/api/history/{id}", get(handlers::history_item))
        .route("/api/history/{id}/search", post(handlers::history_search))
        .route("/api/history/{id}/action", post(handlers::history_action))
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    let app = match web_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };
    app.layer(from_fn(middleware::no_store_assets))
        .layer(from_fn(middleware::log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors())
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(build_state(&config)?);
    let app = create_app(state, Some(&config.web_dir));
    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;

    tracing::info!(config = %config, "JQL API listening");
    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
