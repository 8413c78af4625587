//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate exponential backoff delay: `min(base × factor^attempt, max)`.
///
/// With `jitter`, the capped delay is scaled by a uniform factor in
/// `[0.5, 1.0]`, so it never exceeds `max` either way.
pub fn calculate_backoff(
    attempt: u32,
    base: Duration,
    max: Duration,
    factor: f64,
    jitter: bool,
) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let raw = base.as_secs_f64() * factor.powi(exponent);

    // powi overflows to +inf for large attempts; NaN only from a bad factor
    let capped = if raw.is_finite() {
        raw.min(max.as_secs_f64())
    } else {
        max.as_secs_f64()
    };

    let scaled = if jitter {
        capped * rand::thread_rng().gen_range(0.5..=1.0)
    } else {
        capped
    };

    Duration::from_secs_f64(scaled.max(0.0)).min(max)
}
