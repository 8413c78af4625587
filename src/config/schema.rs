//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::history::DEFAULT_HISTORY_CAPACITY;
use crate::client::ClientOptions;
use crate::load_balancer::LoadBalancerKind;
use crate::registry::{Endpoint, HealthStatus, DEFAULT_WEIGHT};
use crate::resilience::{CircuitBreakerConfig, RetryPolicy};

/// Root configuration for the service client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-service circuit breaker settings.
    pub circuit_breaker: CircuitBreakerSettings,

    /// Retry configuration.
    pub retry: RetrySettings,

    /// Endpoint selection strategy.
    pub load_balancer: LoadBalancerSettings,

    /// Registry behavior.
    pub registry: RegistrySettings,

    /// Call history settings.
    pub history: HistorySettings,

    /// Timeout configuration.
    pub timeouts: TimeoutSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Statically declared endpoints.
    pub endpoints: Vec<EndpointConfig>,
}

impl ClientConfig {
    /// Runtime options for a [`ServiceClient`](crate::client::ServiceClient).
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            circuit_breaker: self.circuit_breaker.to_breaker_config(),
            retry: self.retry.to_policy(),
            load_balancer: self.load_balancer.strategy,
            fallback_to_all_endpoints: self.registry.fallback_to_all_endpoints,
            history_capacity: self.history.capacity,
            attempt_timeout: self.timeouts.attempt_timeout(),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Consecutive failed calls before the circuit opens.
    pub failure_threshold: u32,

    /// Time the circuit stays open before probing, in milliseconds.
    pub recovery_timeout_ms: u64,

    /// Trial calls allowed while half-open.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 30_000,
            half_open_max_calls: 3,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: Duration::from_millis(self.recovery_timeout_ms),
            half_open_max_calls: self.half_open_max_calls,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Multiplier applied per attempt.
    pub exponential_factor: f64,

    /// Randomize delays into [50%, 100%] of the computed value.
    pub jitter: bool,

    /// Upstream status codes treated as transient.
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            exponential_factor: policy.exponential_factor,
            jitter: policy.jitter_enabled,
            retryable_status_codes: policy.retryable_status_codes,
        }
    }
}

impl RetrySettings {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            exponential_factor: self.exponential_factor,
            jitter_enabled: self.jitter,
            retryable_status_codes: self.retryable_status_codes.clone(),
        }
    }
}

/// Load balancer configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoadBalancerSettings {
    /// `round_robin` or `weighted`.
    pub strategy: LoadBalancerKind,
}

/// Registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Call all endpoints of a service when none is marked healthy.
    pub fallback_to_all_endpoints: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            fallback_to_all_endpoints: true,
        }
    }
}

/// Call history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Records kept before the oldest is evicted.
    pub capacity: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Per-attempt timeout in milliseconds (0 disables it).
    pub attempt_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { attempt_ms: 10_000 }
    }
}

impl TimeoutSettings {
    pub fn attempt_timeout(&self) -> Option<Duration> {
        (self.attempt_ms > 0).then(|| Duration::from_millis(self.attempt_ms))
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Endpoint declared in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Service name this endpoint serves.
    pub service: String,

    pub host: String,

    pub port: u16,

    /// Weight for weighted load balancing (default: 100).
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Initial health status (default: unknown).
    #[serde(default)]
    pub status: HealthStatus,
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

impl EndpointConfig {
    pub fn to_endpoint(&self) -> Endpoint {
        Endpoint::new(&self.service, &self.host, self.port)
            .with_weight(self.weight)
            .with_status(self.status)
    }
}
