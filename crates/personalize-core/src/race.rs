//! First-result-wins timeout races.
//!
//! The raced future is spawned onto the runtime and its handle is raced
//! against a timer. When the timer wins, the task is left running and its
//! eventual output is discarded. In-flight requests are abandoned, not
//! aborted, so a detached task holds its resources until it finishes.

use std::future::Future;
use std::time::Duration;

/// Why a race produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceLost {
    TimedOut { after_ms: u64 },
    Panicked(String),
}

impl std::fmt::Display for RaceLost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaceLost::TimedOut { after_ms } => write!(f, "timed out after {after_ms}ms"),
            RaceLost::Panicked(msg) => write!(f, "task failed: {msg}"),
        }
    }
}

/// Run `fut` on its own task and wait at most `budget` for it.
pub async fn first_or_timeout<F>(budget: Duration, fut: F) -> Result<F::Output, RaceLost>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(fut);
    match tokio::time::timeout(budget, handle).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_err)) => Err(RaceLost::Panicked(join_err.to_string())),
        // Dropping the JoinHandle detaches the task; it is not aborted.
        Err(_) => Err(RaceLost::TimedOut {
            after_ms: budget.as_millis() as u64,
        }),
    }
}
