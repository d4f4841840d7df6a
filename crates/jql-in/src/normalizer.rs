//! Text normalization for keyword matching.
//!
//! - Lowercase conversion
//! - Whitespace normalization
//! - Typographic quotes folded to ASCII

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Multiple whitespace pattern
    static ref MULTI_SPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize text for keyword matching
pub fn normalize(text: &str) -> String {
    let lowered = text
        .to_lowercase()
        .replace(['“', '”', '«', '»'], "\"")
        .replace('ё', "е");
    MULTI_SPACE.replace_all(lowered.trim(), " ").to_string()
}

/// The text intents are read from: the request and the query built so far.
pub fn signal_text(raw_text: &str, query: &str) -> String {
    normalize(&format!("{} {}", raw_text, query))
}
