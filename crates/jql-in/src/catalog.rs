//! Keyword catalog loading.
//!
//! The catalog is a YAML file mapping locale → keyword sets. All locales are
//! merged into one [`KeywordCatalog`]; keywords are lower-cased at load time.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Catalog shipped with the crate.
pub const DEFAULT_CATALOG: &str = include_str!("../../../grammars/intent-keywords.yaml");

lazy_static! {
    static ref BUILTIN: KeywordCatalog =
        KeywordCatalog::from_yaml(DEFAULT_CATALOG).expect("embedded keyword catalog is valid");
}

/// Top-level catalog file structure
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFile {
    pub version: String,
    pub locales: BTreeMap<String, LocaleKeywords>,
}

/// Keyword sets of a single locale
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleKeywords {
    #[serde(default)]
    pub bug: Vec<String>,
    #[serde(default)]
    pub worklog: Vec<String>,
    #[serde(default)]
    pub sprint: Vec<String>,
    #[serde(default)]
    pub week_window: Vec<String>,
    #[serde(default)]
    pub title_directives: Vec<String>,
    #[serde(default)]
    pub title_stop_words: Vec<String>,
    #[serde(default)]
    pub query_syntax_markers: Vec<String>,
}

/// Merged, matching-ready catalog
#[derive(Debug, Clone)]
pub struct KeywordCatalog {
    pub locales: Vec<String>,
    pub bug: Vec<String>,
    pub worklog: Vec<String>,
    pub sprint: Vec<String>,
    pub week_window: Vec<String>,
    pub title_stop_words: Vec<String>,
    pub query_syntax_markers: Vec<String>,
    /// `<directive> [:-] <value>`, value in group 1
    pub title_directive: Option<Regex>,
    /// `<sprint word> N` or `N <sprint word>`, number in group 1 or 2
    pub sprint_number: Option<Regex>,
}

impl KeywordCatalog {
    /// The embedded default catalog.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Load and compile a catalog from a YAML file
    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read keyword catalog: {}", e))?;
        Self::from_yaml(&content)
    }

    /// Compile a catalog from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let file: CatalogFile = serde_yaml::from_str(yaml)
            .map_err(|e| format!("Failed to parse keyword catalog YAML: {}", e))?;
        if file.locales.is_empty() {
            return Err("Keyword catalog defines no locales".to_string());
        }

        let mut merged = LocaleKeywords::default();
        for keywords in file.locales.values() {
            extend_lower(&mut merged.bug, &keywords.bug);
            extend_lower(&mut merged.worklog, &keywords.worklog);
            extend_lower(&mut merged.sprint, &keywords.sprint);
            extend_lower(&mut merged.week_window, &keywords.week_window);
            extend_lower(&mut merged.title_directives, &keywords.title_directives);
            extend_lower(&mut merged.title_stop_words, &keywords.title_stop_words);
            extend_lower(&mut merged.query_syntax_markers, &keywords.query_syntax_markers);
        }

        Ok(KeywordCatalog {
            locales: file.locales.keys().cloned().collect(),
            title_directive: compile_directive(&merged.title_directives)?,
            sprint_number: compile_sprint_number(&merged.sprint)?,
            bug: merged.bug,
            worklog: merged.worklog,
            sprint: merged.sprint,
            week_window: merged.week_window,
            title_stop_words: merged.title_stop_words,
            query_syntax_markers: merged.query_syntax_markers,
        })
    }
}

impl Default for KeywordCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// True if `text` (already lower-cased) contains any of `keywords`.
pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

fn extend_lower(into: &mut Vec<String>, from: &[String]) {
    for keyword in from {
        // Markers like "project " keep their trailing space.
        let keyword = keyword.to_lowercase();
        if !keyword.trim().is_empty() && !into.contains(&keyword) {
            into.push(keyword);
        }
    }
}

/// Longer directives first so `названием` wins over `название`.
fn compile_directive(directives: &[String]) -> Result<Option<Regex>, String> {
    if directives.is_empty() {
        return Ok(None);
    }
    let mut sorted: Vec<&String> = directives.iter().collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    let alternation = sorted
        .iter()
        .map(|d| regex::escape(d.trim()))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)(?:{})\s*[:\-]\s*(.+)", alternation);
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| format!("Invalid title directive pattern: {}", e))
}

fn compile_sprint_number(words: &[String]) -> Result<Option<Regex>, String> {
    if words.is_empty() {
        return Ok(None);
    }
    let alternation = words
        .iter()
        .map(|w| regex::escape(w.trim()))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)(?:{0})\s*([0-9]+)|([0-9]+)\s*(?:{0})", alternation);
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| format!("Invalid sprint number pattern: {}", e))
}
