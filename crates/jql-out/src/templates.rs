//! Response templates file.
//!
//! The workspace ships `grammars/response-templates.yaml`, embedded as the
//! default. A replacement file must define every name in [`REQUIRED`].

use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_TEMPLATES: &str = include_str!("../../../grammars/response-templates.yaml");

/// Template names the texts layer renders.
pub const REQUIRED: &[&str] = &[
    "generate_step",
    "search_step",
    "analysis_step",
    "issue_details_step",
    "worklog_summary",
    "follow_up_context",
];

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read templates file: {}", e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let file: TemplatesFile = serde_yaml::from_str(yaml)
            .map_err(|e| format!("Failed to parse templates YAML: {}", e))?;
        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| !file.templates.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing templates: {}", missing.join(", ")));
        }
        Ok(file)
    }

    pub fn builtin() -> Result<Self, String> {
        Self::from_yaml(DEFAULT_TEMPLATES)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }
}
