//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_client_calls_total` (counter): calls by service, outcome
//! - `service_client_call_duration_seconds` (histogram): call latency incl. retries
//! - `service_client_retries_total` (counter): retried attempts by service
//! - `service_client_breaker_transitions_total` (counter): by service, target state
//!
//! Without an installed recorder these are no-ops.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

use crate::resilience::CircuitState;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_call(service: &str, outcome: &'static str, duration: Duration) {
    counter!(
        "service_client_calls_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    if outcome != "rejected" {
        histogram!("service_client_call_duration_seconds", "service" => service.to_string())
            .record(duration.as_secs_f64());
    }
}

pub fn record_retry(service: &str) {
    counter!("service_client_retries_total", "service" => service.to_string()).increment(1);
}

pub fn record_breaker_transition(service: &str, to: CircuitState) {
    counter!(
        "service_client_breaker_transitions_total",
        "service" => service.to_string(),
        "state" => to.to_string()
    )
    .increment(1);
}
