//! Issue tracker client: Jira Server REST API v2 and Agile API 1.0 over
//! `reqwest`, with HTTP basic auth.
pub mod client;

pub use client::{JiraClient, TrackerConfig, DEFAULT_TIMEOUT};
