//! Saved phrases: canned requests the user picks from.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::file::{read_json, write_json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrase {
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Phrase {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: String::new(),
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Trim both fields, drop blank texts, keep the first phrase per text.
pub fn normalize_phrases(list: Vec<Phrase>) -> Vec<Phrase> {
    let mut seen = HashSet::new();
    list.into_iter()
        .map(|p| Phrase {
            text: p.text.trim().to_string(),
            description: p.description.trim().to_string(),
        })
        .filter(|p| !p.text.is_empty())
        .filter(|p| seen.insert(p.text.clone()))
        .collect()
}

/// On-disk formats: the current list of objects, or the older list of
/// plain strings.
fn decode(raw: Value) -> Option<(Vec<Phrase>, bool)> {
    if let Ok(phrases) = serde_json::from_value::<Vec<Phrase>>(raw.clone()) {
        return Some((phrases, false));
    }
    let legacy: Vec<String> = serde_json::from_value(raw).ok()?;
    Some((normalize_phrases(legacy.into_iter().map(Phrase::new).collect()), true))
}

pub struct PhraseStore {
    path: PathBuf,
    phrases: Mutex<Vec<Phrase>>,
}

impl PhraseStore {
    /// Open the store. A file in the older string-list format is converted
    /// and written back.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let raw = match read_json::<Value>(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "phrases file unreadable, starting empty");
                None
            }
        };
        let (phrases, migrated) = raw.and_then(decode).unwrap_or_default();
        if migrated {
            match write_json(&path, &phrases) {
                Ok(()) => info!(path = %path.display(), count = phrases.len(), "phrases converted to the object format"),
                Err(err) => warn!(path = %path.display(), error = %err, "could not rewrite converted phrases"),
            }
        }
        Self {
            path,
            phrases: Mutex::new(phrases),
        }
    }

    pub fn list(&self) -> Vec<Phrase> {
        self.phrases.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Overwrite the whole list. Returns what was stored.
    pub fn replace(&self, list: Vec<Phrase>) -> Result<Vec<Phrase>, StoreError> {
        let normalized = normalize_phrases(list);
        let mut phrases = self.phrases.lock().map_err(|_| StoreError::Poisoned)?;
        write_json(&self.path, &normalized)?;
        *phrases = normalized.clone();
        Ok(normalized)
    }
}
