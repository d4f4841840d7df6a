//! Generative assistant over an OpenAI-compatible chat completions API:
//! query suggestions, result summaries and follow-up answers.
pub mod client;
pub mod models;
pub mod prompts;

pub use client::{AssistantSettings, OpenAiAssistant, DEFAULT_BASE_URL, DEFAULT_MODEL};
