//! JQL-OUT: human-readable texts for search responses
//!
//! Step descriptions, the worklog summary line and the context handed to the
//! assistant for follow-up commands, rendered from
//! `grammars/response-templates.yaml` (or a replacement file).
//!
//! ```ignore
//! let texts = ResponseTexts::builtin()?;
//! assert_eq!(texts.search_step(3), "Fetched 3 issues via Jira");
//! ```

pub mod renderer;
pub mod templates;

use jql_core::IssueLink;
use renderer::TemplateRenderer;
use serde::Serialize;
use serde_json::{json, Value};
use templates::TemplatesFile;
use thiserror::Error;
use tracing::warn;

/// Issues listed in a follow-up context.
pub const CONTEXT_ISSUES: usize = 6;
/// Raw search JSON carried in a follow-up context.
pub const CONTEXT_RAW_LIMIT: usize = 2000;
/// Whole follow-up context.
pub const CONTEXT_LIMIT: usize = 4000;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template load failed: {0}")]
    Template(String),
    #[error("Render failed: {0}")]
    Render(String),
}

/// What a follow-up command gets to see of a past search.
#[derive(Debug, Clone, Default)]
pub struct FollowUpContext<'a> {
    pub query: &'a str,
    pub jql: &'a str,
    pub analysis: &'a str,
    pub issues: &'a [IssueLink],
    /// Result of the search step, if recorded.
    pub raw: Option<&'a Value>,
}

/// Worklog figures the summary line is rendered from.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WorklogFigures {
    pub hours: f64,
    pub issues_scanned: u64,
    pub possibly_incomplete: bool,
}

pub struct ResponseTexts {
    renderer: TemplateRenderer,
}

impl ResponseTexts {
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_file(&TemplatesFile::builtin().map_err(RenderError::Template)?)
    }

    pub fn load(path: &str) -> Result<Self, RenderError> {
        Self::from_file(&TemplatesFile::load(path).map_err(RenderError::Template)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        Self::from_file(&TemplatesFile::from_yaml(yaml).map_err(RenderError::Template)?)
    }

    fn from_file(file: &TemplatesFile) -> Result<Self, RenderError> {
        let renderer = TemplateRenderer::new(file).map_err(RenderError::Template)?;
        Ok(Self { renderer })
    }

    pub fn render(&self, name: &str, data: &Value) -> Result<String, RenderError> {
        self.renderer.render(name, data).map_err(RenderError::Render)
    }

    /// Render, falling back to `fallback` when a replacement template breaks
    /// at render time.
    fn render_or(&self, name: &str, data: &Value, fallback: impl FnOnce() -> String) -> String {
        match self.render(name, data) {
            Ok(text) => text,
            Err(err) => {
                warn!(template = name, error = %err, "template render failed");
                fallback()
            }
        }
    }

    pub fn generate_step(&self, title: Option<&str>) -> String {
        self.render_or("generate_step", &json!({ "title": title }), || match title {
            Some(t) => format!("Search by title: {}", t),
            None => "Derived from the user query and selected filters".to_string(),
        })
    }

    pub fn search_step(&self, total: u64) -> String {
        self.render_or("search_step", &json!({ "total": total }), || {
            format!("Fetched {} issues via Jira", total)
        })
    }

    pub fn analysis_step(&self) -> String {
        self.render_or("analysis_step", &json!({}), || {
            "Summary generated by worklog aggregation or the LLM".to_string()
        })
    }

    pub fn issue_details_step(&self, key: Option<&str>) -> String {
        self.render_or("issue_details_step", &json!({ "key": key }), || match key {
            Some(k) => format!("Collected extra details for issue {}", k),
            None => "Collected extra details for the found issue".to_string(),
        })
    }

    pub fn worklog_summary(&self, figures: WorklogFigures) -> String {
        let data = serde_json::to_value(figures).unwrap_or_default();
        self.render_or("worklog_summary", &data, || {
            format!("Logged this month: {:.2} h", figures.hours)
        })
    }

    /// Follow-up context: at most six issues, the raw search JSON cut to
    /// 2000 bytes, the whole text cut to 4000.
    pub fn follow_up_context(&self, ctx: &FollowUpContext<'_>) -> String {
        let issues = &ctx.issues[..ctx.issues.len().min(CONTEXT_ISSUES)];
        let raw = ctx
            .raw
            .filter(|v| !v.is_null())
            .map(|v| cut(&v.to_string(), CONTEXT_RAW_LIMIT).to_string());
        let data = json!({
            "query": ctx.query.trim(),
            "jql": ctx.jql.trim(),
            "analysis": ctx.analysis.trim(),
            "issues": issues,
            "raw": raw,
        });
        let text = self.render_or("follow_up_context", &data, || {
            format!("Original query: {}\nExecuted JQL: {}\n", ctx.query, ctx.jql)
        });
        cut(&text, CONTEXT_LIMIT).to_string()
    }
}

/// Longest prefix of `s` within `limit` bytes that ends on a char boundary.
pub fn cut(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_respects_char_boundary() {
        assert_eq!(cut("abc", 10), "abc");
        assert_eq!(cut("жжж", 3), "ж");
        assert_eq!(cut("abc", 2), "ab");
    }

    #[test]
    fn test_step_texts() {
        let texts = ResponseTexts::builtin().unwrap();
        assert_eq!(texts.search_step(3), "Fetched 3 issues via Jira");
        assert_eq!(
            texts.generate_step(None),
            "Derived from the user query and selected filters"
        );
        assert_eq!(
            texts.generate_step(Some("Новый логин")),
            "Search by title: Новый логин"
        );
        assert_eq!(
            texts.issue_details_step(Some("CE-7")),
            "Collected extra details for issue CE-7"
        );
    }
}
