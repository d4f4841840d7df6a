//! JQL clause handling.
//!
//! A query is split at its top-level `AND`/`OR` connectors into a
//! [`ClauseList`]. Rewrites (clause overrides, default filters, date ranges)
//! operate on that list and render it back, so they never leave a dangling
//! connector behind.
pub mod ast;
pub mod parser;
pub mod rewriter;
pub mod serializer;
pub mod utils;

pub use ast::{Clause, ClauseKind, ClauseList, Connector};
pub use parser::parse_query;
pub use rewriter::{apply_date_range, apply_default_filters, override_clause, strip_literal_range};
pub use serializer::render_query;
pub use utils::{clean_query, escape_quotes, normalize_clause, quote_list};
