//! Execution Context: per-request state threaded through the pipeline.
//!
//! Carries the trace id, the clock anchor used for every "current moment"
//! computation, and the deadline/cancellation signal that each external
//! call is raced against.
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::capability::TrackerError;
use crate::error::QueryError;

/// Raised when an external call observes cancellation or the deadline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct Interrupted(pub &'static str);

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub trace_id: String,
    pub now: DateTime<Utc>,
    pub deadline: Option<Instant>,
    pub cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            now: Utc::now(),
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Pin the clock anchor, used by tests and replays.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn is_interrupted(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drive `fut` to completion unless the caller cancels or the deadline
    /// passes first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted("cancelled by caller"));
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted("cancelled by caller")),
            _ = sleep_until(self.deadline) => Err(Interrupted("deadline exceeded")),
            out = fut => Ok(out),
        }
    }

    /// Run a tracker call. Interruption surfaces as `QueryError::Cancelled`;
    /// any other tracker failure is handed back for the caller to judge.
    pub async fn call<T, F>(&self, fut: F) -> Result<Result<T, TrackerError>, QueryError>
    where
        F: Future<Output = Result<T, TrackerError>>,
    {
        match self.run(fut).await {
            Err(interrupted) => Err(interrupted.into()),
            Ok(Err(TrackerError::Cancelled(reason))) => Err(QueryError::Cancelled(reason)),
            Ok(other) => Ok(other),
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = ExecutionContext::new();
        let out = ctx.run(async { 7 }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_run_observes_cancellation() {
        let token = CancellationToken::new();
        let ctx = ExecutionContext::new().with_cancellation(token.clone());
        token.cancel();
        let out = ctx.run(async { 7 }).await;
        assert_eq!(out, Err(Interrupted("cancelled by caller")));
        assert!(ctx.is_interrupted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_observes_deadline() {
        let ctx = ExecutionContext::new().with_timeout(Duration::from_millis(10));
        let out = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                7
            })
            .await;
        assert_eq!(out, Err(Interrupted("deadline exceeded")));
    }

    #[tokio::test]
    async fn test_call_separates_cancellation_from_failure() {
        let ctx = ExecutionContext::new();
        let failed = ctx
            .call(async { Err::<(), _>(TrackerError::Transport("reset".into())) })
            .await;
        assert_eq!(failed, Ok(Err(TrackerError::Transport("reset".into()))));

        let cancelled = ctx
            .call(async { Err::<(), _>(TrackerError::Cancelled("aborted".into())) })
            .await;
        assert_eq!(cancelled, Err(QueryError::Cancelled("aborted".into())));
    }
}
