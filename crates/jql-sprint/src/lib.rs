//! Sprint scoping: which board a project uses, which dates a sprint-scoped
//! request covers, and which sprints a board currently offers.
pub mod boards;
pub mod listing;
pub mod resolver;

pub use boards::BoardDirectory;
pub use listing::{board_sprints, sprint_limit, DEFAULT_SPRINT_LIMIT, MAX_SPRINT_LIMIT};
pub use resolver::{fallback_range, SprintResolver};

use chrono::Weekday;

/// Parse a weekday name such as `thu` or `Thursday`.
pub fn parse_weekday(raw: &str) -> Result<Weekday, String> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday {:?}", raw.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("thu"), Ok(Weekday::Thu));
        assert_eq!(parse_weekday(" Monday "), Ok(Weekday::Mon));
        assert!(parse_weekday("someday").is_err());
    }
}
