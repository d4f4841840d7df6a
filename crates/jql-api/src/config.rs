//! Service configuration from the environment.
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Weekday;
use jql_assistant::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use jql_sprint::{parse_weekday, BoardDirectory};
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Projects hidden from the project picker unless `PROJECT_BLOCKLIST` says
/// otherwise.
pub const DEFAULT_BLOCKLIST: &[&str] = &[
    "AMP", "CONE", "COR", "CRED", "DEEP", "TP", "IC", "SEC", "MS", "QAD", "SEN", "SIMTW", "TDS",
    "WU",
];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct Config {
    pub addr: String,
    pub jira_host: String,
    pub jira_user: String,
    pub jira_password: String,
    pub web_dir: PathBuf,
    pub data_dir: PathBuf,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub boards: BoardDirectory,
    pub keywords_path: Option<String>,
    pub templates_path: Option<String>,
    pub project_blocklist: Vec<String>,
    pub request_timeout: Duration,
    pub fallback_weekday: Weekday,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let jira_password = get("JIRA_PASSWORD")
            .or_else(|| get("JIRA_PASS"))
            .ok_or(ConfigError::Missing("JIRA_PASSWORD"))?;

        let board_id = match get("JIRA_BOARD_ID") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "JIRA_BOARD_ID",
                reason: format!("{:?} is not a number", raw),
            })?,
            None => 0,
        };
        let boards = BoardDirectory::parse(&get("JIRA_BOARDS").unwrap_or_default())
            .map_err(|reason| ConfigError::Invalid {
                name: "JIRA_BOARDS",
                reason,
            })?
            .with_default(board_id);

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "REQUEST_TIMEOUT_SECS",
                        reason: format!("{:?} is not a positive number of seconds", raw),
                    })
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let fallback_weekday = match get("SPRINT_FALLBACK_WEEKDAY") {
            Some(raw) => parse_weekday(&raw).map_err(|reason| ConfigError::Invalid {
                name: "SPRINT_FALLBACK_WEEKDAY",
                reason,
            })?,
            None => Weekday::Thu,
        };

        let project_blocklist = match get("PROJECT_BLOCKLIST") {
            Some(raw) => raw
                .split(',')
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect(),
            None => DEFAULT_BLOCKLIST.iter().map(|k| k.to_string()).collect(),
        };

        Ok(Self {
            addr: get("ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            jira_host: required("JIRA_HOST")?,
            jira_user: required("JIRA_USER")?,
            jira_password,
            web_dir: PathBuf::from(get("WEB_DIR").unwrap_or_else(|| "./web".to_string())),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "./data".to_string())),
            openai_api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            boards,
            keywords_path: get("JQL_KEYWORDS_PATH"),
            templates_path: get("JQL_TEMPLATES_PATH"),
            project_blocklist,
            request_timeout,
            fallback_weekday,
        })
    }

    pub fn assistant_enabled(&self) -> bool {
        !self.openai_api_key.is_empty()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "addr={} jira={} user={} web={} data={} assistant={} timeout={}s fallback={}",
            self.addr,
            self.jira_host,
            self.jira_user,
            self.web_dir.display(),
            self.data_dir.display(),
            if self.assistant_enabled() {
                self.openai_model.as_str()
            } else {
                "off"
            },
            self.request_timeout.as_secs(),
            self.fallback_weekday,
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
