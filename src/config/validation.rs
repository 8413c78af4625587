//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, factor >= 1, max >= base)
//! - Detect duplicate endpoint declarations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("circuit_breaker.failure_threshold must be at least 1")]
    FailureThresholdZero,

    #[error("circuit_breaker.half_open_max_calls must be at least 1")]
    HalfOpenMaxCallsZero,

    #[error("retry.exponential_factor must be a finite number >= 1.0 (got {0})")]
    ExponentialFactor(f64),

    #[error("retry.max_delay_ms ({max}) is below retry.base_delay_ms ({base})")]
    MaxDelayBelowBase { base: u64, max: u64 },

    #[error("history.capacity must be at least 1")]
    HistoryCapacityZero,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("endpoints[{index}]: {reason}")]
    Endpoint { index: usize, reason: String },

    #[error("endpoint {host}:{port} declared twice for service '{service}'")]
    DuplicateEndpoint { service: String, host: String, port: u16 },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::FailureThresholdZero);
    }
    if config.circuit_breaker.half_open_max_calls == 0 {
        errors.push(ValidationError::HalfOpenMaxCallsZero);
    }

    let factor = config.retry.exponential_factor;
    if !factor.is_finite() || factor < 1.0 {
        errors.push(ValidationError::ExponentialFactor(factor));
    }
    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        errors.push(ValidationError::MaxDelayBelowBase {
            base: config.retry.base_delay_ms,
            max: config.retry.max_delay_ms,
        });
    }

    if config.history.capacity == 0 {
        errors.push(ValidationError::HistoryCapacityZero);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for (index, ep) in config.endpoints.iter().enumerate() {
        if ep.service.trim().is_empty() {
            errors.push(ValidationError::Endpoint {
                index,
                reason: "service name is empty".to_string(),
            });
        }
        if ep.host.trim().is_empty() {
            errors.push(ValidationError::Endpoint {
                index,
                reason: "host is empty".to_string(),
            });
        }
        if ep.port == 0 {
            errors.push(ValidationError::Endpoint {
                index,
                reason: "port must be non-zero".to_string(),
            });
        }
        if !seen.insert((ep.service.as_str(), ep.host.as_str(), ep.port)) {
            errors.push(ValidationError::DuplicateEndpoint {
                service: ep.service.clone(),
                host: ep.host.clone(),
                port: ep.port,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
