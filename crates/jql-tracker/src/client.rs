use std::time::Duration;

use async_trait::async_trait;
use jql_core::{Board, IssueTracker, SearchPage, Sprint, SprintState, TrackerError};
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Per-request timeout of the tracker client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_SPRINT_PAGE: u32 = 200;

fn transport_err(e: reqwest::Error) -> TrackerError {
    TrackerError::Transport(e.to_string())
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

impl TrackerConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct SearchBody<'a> {
    jql: &'a str,
    #[serde(rename = "maxResults")]
    max_results: u32,
    #[serde(rename = "startAt")]
    start_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [String]>,
}

/// Agile API list envelope.
#[derive(Deserialize)]
struct Values<T> {
    #[serde(default = "Vec::new")]
    values: Vec<T>,
}

/// HTTP client for Jira Server: REST API v2 plus Agile API 1.0, basic auth.
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

impl JiraClient {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport_err)?;
        Ok(Self {
            http,
            base_url: normalize_host(&config.host),
            user: config.user,
            password: config.password,
        })
    }

    /// Absolute URL of a REST path; the path may carry a query string.
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn authed(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        debug!(%method, path, "jira request");
        self.http
            .request(method, self.url(path))
            .basic_auth(&self.user, Some(&self.password))
            .header(ACCEPT, "application/json")
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, TrackerError> {
        let resp = req.send().await.map_err(transport_err)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TrackerError::Status {
                status: status.as_u16(),
                message: format!("jira: {}", status),
                body,
            });
        }
        let bytes = resp.bytes().await.map_err(transport_err)?;
        serde_json::from_slice(&bytes).map_err(|e| TrackerError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TrackerError> {
        self.send_json(self.authed(Method::GET, path)).await
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn search(
        &self,
        query: &str,
        max_results: u32,
        start_at: u64,
        fields: &[String],
    ) -> Result<SearchPage, TrackerError> {
        let body = SearchBody {
            jql: query,
            max_results,
            start_at,
            fields: (!fields.is_empty()).then_some(fields),
        };
        let raw: Value = self
            .send_json(self.authed(Method::POST, "/rest/api/2/search").json(&body))
            .await?;
        Ok(SearchPage::from_raw(raw))
    }

    async fn get(&self, path: &str) -> Result<Value, TrackerError> {
        self.get_json(path).await
    }

    async fn list_sprints(
        &self,
        board_id: u64,
        state: SprintState,
        max_results: u32,
    ) -> Result<Vec<Sprint>, TrackerError> {
        let page: Values<Sprint> = self
            .get_json(&sprints_path(board_id, state, max_results))
            .await?;
        Ok(page.values)
    }

    async fn get_sprint(&self, sprint_id: u64) -> Result<Sprint, TrackerError> {
        self.get_json(&format!("/rest/agile/1.0/sprint/{}", sprint_id))
            .await
    }

    async fn active_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, TrackerError> {
        let page: Values<Sprint> = self
            .get_json(&format!("/rest/agile/1.0/board/{}/sprint?state=active", board_id))
            .await?;
        Ok(page.values)
    }

    async fn boards_for_project(&self, project_key: &str) -> Result<Vec<Board>, TrackerError> {
        let page: Values<Board> = self.get_json(&boards_path(project_key)).await?;
        Ok(page.values)
    }

    async fn myself(&self) -> Result<Value, TrackerError> {
        self.get_json("/rest/api/2/myself").await
    }

    fn requester(&self) -> &str {
        &self.user
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

fn sprints_path(board_id: u64, state: SprintState, max_results: u32) -> String {
    let max = if max_results == 0 || max_results > MAX_SPRINT_PAGE {
        MAX_SPRINT_PAGE
    } else {
        max_results
    };
    format!(
        "/rest/agile/1.0/board/{}/sprint?state={}&maxResults={}",
        board_id,
        state.as_str(),
        max
    )
}

fn boards_path(project_key: &str) -> String {
    format!(
        "/rest/agile/1.0/board?projectKeyOrId={}&type=scrum",
        urlencoding::encode(project_key.trim())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_trailing_slashes_trimmed() {
        let client = JiraClient::new(TrackerConfig::new(" https://jira.example.com// ", "u", "p")).unwrap();
        assert_eq!(client.base_url(), "https://jira.example.com");
        assert_eq!(
            client.url("/rest/api/2/myself"),
            "https://jira.example.com/rest/api/2/myself"
        );
        assert_eq!(
            client.url("rest/api/2/issue/CE-1?fields=summary"),
            "https://jira.example.com/rest/api/2/issue/CE-1?fields=summary"
        );
        assert_eq!(client.requester(), "u");
    }

    #[test]
    fn test_sprint_page_clamped() {
        assert!(sprints_path(209, SprintState::Closed, 0).ends_with("state=closed&maxResults=200"));
        assert!(sprints_path(209, SprintState::Future, 500).ends_with("maxResults=200"));
        assert!(sprints_path(209, SprintState::Active, 50).ends_with("state=active&maxResults=50"));
    }

    #[test]
    fn test_board_lookup_key_encoded() {
        assert_eq!(
            boards_path(" CE&X "),
            "/rest/agile/1.0/board?projectKeyOrId=CE%26X&type=scrum"
        );
    }

    #[test]
    fn test_search_body_omits_empty_fields() {
        let body = SearchBody {
            jql: "project = CE",
            max_results: 50,
            start_at: 0,
            fields: None,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "jql": "project = CE", "maxResults": 50, "startAt": 0 })
        );
    }
}
