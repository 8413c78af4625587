//! Circuit breaker for service protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: service assumed down, calls fail fast
//! - Half-Open: a bounded number of trial calls test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: first admission after recovery_timeout
//! Half-Open → Closed: half_open_max_calls trial successes
//! Half-Open → Open: any trial failure
//! Half-Open → Half-Open: slots still held after recovery_timeout are re-armed
//! ```
//!
//! # Design Decisions
//! - Per-service circuit breaker (not global), each with its own lock
//! - Half-open slots are reserved when a call is admitted, not when it completes
//! - A [`CallPermit`] hands its slot back on drop unless an outcome was recorded,
//!   so a cancelled call cannot hold a slot
//! - Slots are tagged with the half-open period that issued them; a late
//!   release from an earlier period is ignored

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(s)
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time the circuit stays open before admitting trial calls.
    pub recovery_timeout: Duration,
    /// Trial calls allowed (and successes needed) while half-open.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }
}

/// Point-in-time view of a breaker, for stats and admin output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_half_open_successes: u32,
    pub half_open_in_flight: u32,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_half_open_successes: u32,
    /// Slots handed out in the current half-open period.
    half_open_calls: u32,
    /// Bumped on every entry into half-open.
    half_open_period: u64,
    half_open_since: Option<Instant>,
    last_failure_time: Option<Instant>,
}

impl Inner {
    fn start_half_open(&mut self) {
        self.consecutive_half_open_successes = 0;
        self.half_open_calls = 1;
        self.half_open_period += 1;
        self.half_open_since = Some(Instant::now());
    }
}

/// Admission through a [`CircuitBreaker`].
///
/// Record the outcome with [`CallPermit::record_success`] or
/// [`CallPermit::record_failure`]. Dropping the permit instead returns its
/// half-open slot, if it holds one.
#[must_use = "dropping a permit releases it without recording an outcome"]
#[derive(Debug)]
pub struct CallPermit {
    breaker: Arc<CircuitBreaker>,
    half_open_period: Option<u64>,
}

impl CallPermit {
    pub fn record_success(mut self) {
        self.half_open_period = None;
        self.breaker.record_success();
    }

    pub fn record_failure(mut self) {
        self.half_open_period = None;
        self.breaker.record_failure();
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if let Some(period) = self.half_open_period.take() {
            self.breaker.release_period(period);
        }
    }
}

/// Per-service circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_half_open_successes: 0,
                half_open_calls: 0,
                half_open_period: 0,
                half_open_since: None,
                last_failure_time: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state. Does not trigger the Open → Half-Open transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            consecutive_half_open_successes: inner.consecutive_half_open_successes,
            half_open_in_flight: inner.half_open_calls,
        }
    }

    /// Check whether a call may proceed, reserving a half-open slot if needed.
    ///
    /// A slot taken this way is only returned by `record_*` or [`release`];
    /// prefer [`try_acquire`] where the call may be cancelled.
    ///
    /// [`release`]: CircuitBreaker::release
    /// [`try_acquire`]: CircuitBreaker::try_acquire
    pub fn can_execute(&self) -> bool {
        self.admit(&mut self.lock())
    }

    /// Admit a call and hand back a permit that owns any half-open slot.
    pub fn try_acquire(self: &Arc<Self>) -> Option<CallPermit> {
        let mut inner = self.lock();
        if !self.admit(&mut inner) {
            return None;
        }
        Some(CallPermit {
            breaker: Arc::clone(self),
            half_open_period: (inner.state == CircuitState::HalfOpen).then_some(inner.half_open_period),
        })
    }

    fn admit(&self, inner: &mut Inner) -> bool {
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let recovered = inner
                    .last_failure_time
                    .map_or(true, |t| t.elapsed() >= self.config.recovery_timeout);
                if !recovered {
                    return false;
                }
                self.transition(inner, CircuitState::HalfOpen);
                inner.start_half_open();
                true
            }
            CircuitState::HalfOpen => {
                if inner.half_open_calls < self.config.half_open_max_calls {
                    inner.half_open_calls += 1;
                    return true;
                }
                let stale = inner
                    .half_open_since
                    .map_or(true, |t| t.elapsed() >= self.config.recovery_timeout);
                if !stale {
                    return false;
                }
                tracing::warn!(
                    service = %self.name,
                    outstanding = inner.half_open_calls,
                    "Half-open calls unresolved past recovery timeout, re-arming"
                );
                inner.start_half_open();
                true
            }
        }
    }

    /// Give back a half-open slot for a permitted call that never reached the service.
    pub fn release(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.half_open_calls = inner.half_open_calls.saturating_sub(1);
        }
    }

    fn release_period(&self, period: u64) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen && inner.half_open_period == period {
            inner.half_open_calls = inner.half_open_calls.saturating_sub(1);
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.consecutive_half_open_successes += 1;
                if inner.consecutive_half_open_successes >= self.config.half_open_max_calls {
                    self.transition(&mut inner, CircuitState::Closed);
                    inner.consecutive_failures = 0;
                    inner.consecutive_half_open_successes = 0;
                    inner.half_open_calls = 0;
                    inner.half_open_since = None;
                }
            }
            CircuitState::Open => {
                // Late result from a call permitted before the circuit opened
                tracing::debug!(service = %self.name, "Success recorded while circuit open, ignoring");
            }
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.last_failure_time = Some(Instant::now());
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                inner.last_failure_time = Some(Instant::now());
                inner.consecutive_half_open_successes = 0;
                inner.half_open_calls = 0;
                inner.half_open_since = None;
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Open => {
                inner.last_failure_time = Some(Instant::now());
            }
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;

        match to {
            CircuitState::Open => tracing::warn!(
                service = %self.name,
                from = %from,
                failures = inner.consecutive_failures,
                recovery_timeout = ?self.config.recovery_timeout,
                "Circuit opened"
            ),
            _ => tracing::info!(service = %self.name, from = %from, to = %to, "Circuit state changed"),
        }
        metrics::record_breaker_transition(&self.name, to);
    }
}
