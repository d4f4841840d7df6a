//! Upcoming and current sprints of a board, for pickers.
use jql_core::{ExecutionContext, IssueTracker, QueryError, Sprint, SprintState};
use tracing::warn;

pub const DEFAULT_SPRINT_LIMIT: usize = 5;
pub const MAX_SPRINT_LIMIT: usize = 50;
const LISTED_STATES: [SprintState; 2] = [SprintState::Active, SprintState::Future];

/// Requested limit, or the default when missing or out of `1..=50`.
pub fn sprint_limit(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n > 0 && n as usize <= MAX_SPRINT_LIMIT => n as usize,
        _ => DEFAULT_SPRINT_LIMIT,
    }
}

/// Active and future sprints, latest end date first. Sprints without an end
/// date sort last. Fails only when every listing call failed.
pub async fn board_sprints(
    tracker: &dyn IssueTracker,
    ctx: &ExecutionContext,
    board_id: u64,
    limit: usize,
) -> Result<Vec<Sprint>, QueryError> {
    let mut all = Vec::new();
    let mut last_err = None;
    let mut any_ok = false;

    for state in LISTED_STATES {
        match ctx
            .call(tracker.list_sprints(board_id, state, MAX_SPRINT_LIMIT as u32))
            .await?
        {
            Ok(sprints) => {
                any_ok = true;
                all.extend(sprints);
            }
            Err(err) => {
                warn!(board = board_id, state = state.as_str(), error = %err, "sprint listing failed");
                last_err = Some(err);
            }
        }
    }

    if !any_ok {
        if let Some(err) = last_err {
            return Err(err.into());
        }
    }

    all.sort_by(|a, b| b.end_key().cmp(&a.end_key()));
    all.truncate(limit);
    Ok(all)
}
