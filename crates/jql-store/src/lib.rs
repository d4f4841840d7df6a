//! JSON-file stores for search history and saved phrases.
//!
//! Both stores keep their list in memory behind a mutex and rewrite the
//! whole file on change. No lock is held across an await. [`write_json`]
//! is shared with the metadata dump.

mod error;
mod file;
pub mod history;
pub mod phrases;

pub use error::StoreError;
pub use file::write_json;
pub use history::{HistoryEntry, HistoryStore, HISTORY_LIMIT};
pub use phrases::{normalize_phrases, Phrase, PhraseStore};
