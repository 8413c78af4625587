//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound each transport attempt by the per-attempt timeout
//! - Clip that bound to the caller's overall deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future cancels the attempt
//! - Timeout errors are distinct from transport errors

use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Budget for the next attempt: the per-attempt timeout, clipped to whatever
/// is left before `deadline`. `None` means no bound at all; `Some(ZERO)` means
/// the deadline has already passed.
pub fn attempt_budget(attempt_timeout: Option<Duration>, deadline: Option<Instant>) -> Option<Duration> {
    let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
    match (attempt_timeout, remaining) {
        (Some(t), Some(r)) => Some(t.min(r)),
        (t, r) => t.or(r),
    }
}

/// Run `fut` under an optional time budget. `Err(budget)` on expiry.
pub async fn run_with_budget<F, T>(budget: Option<Duration>, fut: F) -> Result<T, Duration>
where
    F: Future<Output = T>,
{
    match budget {
        Some(limit) => time::timeout(limit, fut).await.map_err(|_| limit),
        None => Ok(fut.await),
    }
}
