//! Sprint date range resolution.
//!
//! Order: explicit sprint id → sprint number in the text → the board's active
//! sprint → a weekly window anchored on a fixed weekday. Every lookup failure
//! falls through to the next step, so resolution only fails on cancellation.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use jql_core::{
    DateRange, ExecutionContext, IssueTracker, QueryError, RangeSource, Sprint, SprintState,
};
use jql_in::{parse_sprint_number, KeywordCatalog};
use tracing::{debug, warn};

/// States searched, in order, when looking a sprint up by number.
const NUMBER_SEARCH_STATES: [SprintState; 3] =
    [SprintState::Active, SprintState::Future, SprintState::Closed];
const NUMBER_SEARCH_LIMIT: u32 = 200;

pub struct SprintResolver<'a> {
    tracker: &'a dyn IssueTracker,
    catalog: &'a KeywordCatalog,
    fallback_weekday: Weekday,
}

impl<'a> SprintResolver<'a> {
    /// Sprint numbers in the text are recognised by the catalog's sprint words.
    pub fn new(tracker: &'a dyn IssueTracker, catalog: &'a KeywordCatalog) -> Self {
        Self {
            tracker,
            catalog,
            fallback_weekday: Weekday::Thu,
        }
    }

    pub fn with_fallback_weekday(mut self, weekday: Weekday) -> Self {
        self.fallback_weekday = weekday;
        self
    }

    /// Resolve the range for a sprint-scoped request. `text` is the request
    /// text together with the query built so far.
    pub async fn resolve(
        &self,
        ctx: &ExecutionContext,
        sprint_id: Option<u64>,
        text: &str,
        board: Option<u64>,
    ) -> Result<DateRange, QueryError> {
        if let Some(id) = sprint_id {
            if let Some(range) = self.by_id(ctx, id).await? {
                return Ok(range);
            }
        } else if let (Some(number), Some(board)) =
            (parse_sprint_number(text, self.catalog), board)
        {
            if let Some(range) = self.by_number(ctx, board, number).await? {
                return Ok(range);
            }
        }

        if let Some(board) = board {
            if let Some(range) = self.active(ctx, board).await? {
                return Ok(range);
            }
        }

        let range = fallback_range(ctx.now, self.fallback_weekday);
        debug!(start = %range.start, end = %range.end, "sprint range from weekly fallback");
        Ok(range)
    }

    async fn by_id(&self, ctx: &ExecutionContext, id: u64) -> Result<Option<DateRange>, QueryError> {
        match ctx.call(self.tracker.get_sprint(id)).await? {
            Ok(sprint) => {
                let range = sprint.usable_range(RangeSource::ExplicitId);
                if range.is_none() {
                    warn!(sprint = id, "sprint has no usable dates");
                }
                Ok(range)
            }
            Err(err) => {
                warn!(sprint = id, error = %err, "sprint lookup by id failed");
                Ok(None)
            }
        }
    }

    async fn by_number(
        &self,
        ctx: &ExecutionContext,
        board: u64,
        number: u64,
    ) -> Result<Option<DateRange>, QueryError> {
        for state in NUMBER_SEARCH_STATES {
            let sprints = match ctx
                .call(self.tracker.list_sprints(board, state, NUMBER_SEARCH_LIMIT))
                .await?
            {
                Ok(sprints) => sprints,
                Err(err) => {
                    warn!(board, state = state.as_str(), error = %err, "sprint listing failed");
                    continue;
                }
            };
            let found = sprints
                .iter()
                .filter(|s| s.id == number || name_has_number(&s.name, number))
                .find_map(|s| s.usable_range(RangeSource::ExplicitNumber));
            if found.is_some() {
                return Ok(found);
            }
        }
        debug!(board, number, "no sprint matched the number");
        Ok(None)
    }

    async fn active(&self, ctx: &ExecutionContext, board: u64) -> Result<Option<DateRange>, QueryError> {
        match ctx.call(self.tracker.active_sprints(board)).await? {
            Ok(sprints) => Ok(first_usable(&sprints, RangeSource::ActiveLookup)),
            Err(err) => {
                warn!(board, error = %err, "active sprint lookup failed");
                Ok(None)
            }
        }
    }
}

fn first_usable(sprints: &[Sprint], source: RangeSource) -> Option<DateRange> {
    sprints.iter().find_map(|s| s.usable_range(source))
}

/// `number` appears in `name` as a whole number ("Sprint 42" but not "Sprint 142").
fn name_has_number(name: &str, number: u64) -> bool {
    name.split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .any(|part| part.parse::<u64>().ok() == Some(number))
}

/// Most recent `weekday` (today included) through six days later, UTC.
pub fn fallback_range(now: DateTime<Utc>, weekday: Weekday) -> DateRange {
    let today = now.date_naive();
    let back = (7 + today.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    let start = today - Duration::days(back as i64);
    let end = start + Duration::days(6);
    DateRange {
        start,
        end,
        source: RangeSource::FallbackHeuristic,
    }
}
