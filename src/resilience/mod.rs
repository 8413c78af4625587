//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a service:
//!     → circuit_breaker.rs (fail fast while the service is known-bad)
//!     → timeouts.rs (bound each attempt, clip to caller deadline)
//!     → On failure: retries.rs (retryable? budget left?) + backoff.rs (delay)
//!     → circuit_breaker.rs (one outcome per call, not per attempt)
//! ```
//!
//! # Design Decisions
//! - Breakers are per service name, never shared
//! - Retries are local to one call; breaker sees aggregate health
//! - Circuit-open and no-endpoint conditions never consume retry budget

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{
    BreakerSnapshot, CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState,
};
pub use retries::RetryPolicy;
