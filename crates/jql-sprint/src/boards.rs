//! Project → board mapping.
use std::collections::HashMap;

use jql_core::{Board, ExecutionContext, IssueTracker, QueryError};
use tracing::{debug, warn};

/// Board ids known up front, plus an optional board used when a project has
/// no entry of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardDirectory {
    boards: HashMap<String, u64>,
    default_board: Option<u64>,
}

impl BoardDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `KEY=ID,KEY=ID`. Blank input gives an empty directory.
    pub fn parse(mapping: &str) -> Result<Self, String> {
        let mut directory = Self::new();
        for pair in mapping.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, id) = pair
                .split_once('=')
                .ok_or_else(|| format!("board mapping entry {:?} is not KEY=ID", pair))?;
            let id: u64 = id
                .trim()
                .parse()
                .map_err(|_| format!("board id {:?} for {} is not a number", id.trim(), key.trim()))?;
            directory = directory.with_board(key.trim(), id);
        }
        Ok(directory)
    }

    pub fn with_board(mut self, project_key: &str, board_id: u64) -> Self {
        self.boards.insert(project_key.to_uppercase(), board_id);
        self
    }

    /// `0` clears the default.
    pub fn with_default(mut self, board_id: u64) -> Self {
        self.default_board = (board_id > 0).then_some(board_id);
        self
    }

    pub fn mapped(&self, project_key: &str) -> Option<u64> {
        self.boards.get(&project_key.trim().to_uppercase()).copied()
    }

    pub fn default_board(&self) -> Option<u64> {
        self.default_board
    }

    /// Board for a project: mapping, then the default board, then the
    /// tracker's own board list. Lookup failures mean "no board".
    pub async fn board_for(
        &self,
        tracker: &dyn IssueTracker,
        ctx: &ExecutionContext,
        project_key: Option<&str>,
    ) -> Result<Option<u64>, QueryError> {
        if let Some(id) = project_key.and_then(|key| self.mapped(key)) {
            return Ok(Some(id));
        }
        if let Some(id) = self.default_board {
            return Ok(Some(id));
        }
        let Some(key) = project_key.map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(None);
        };
        match ctx.call(tracker.boards_for_project(key)).await? {
            Ok(boards) => {
                let board = pick_board(&boards);
                debug!(project = key, board = ?board, "board looked up");
                Ok(board)
            }
            Err(err) => {
                warn!(project = key, error = %err, "board lookup failed");
                Ok(None)
            }
        }
    }
}

/// First scrum board, else the first board of any kind.
fn pick_board(boards: &[Board]) -> Option<u64> {
    boards
        .iter()
        .find(|b| b.kind.eq_ignore_ascii_case("scrum"))
        .or_else(|| boards.first())
        .map(|b| b.id)
}
