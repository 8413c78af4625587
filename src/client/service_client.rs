//! Service client orchestration.
//!
//! # Responsibilities
//! - Resolve a logical service name to an endpoint per attempt
//! - Gate calls through the service's circuit breaker
//! - Retry transient failures with backoff, bounded by timeouts
//! - Record every attempt in the call history

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime};
use tokio::time::Instant as TokioInstant;
use uuid::Uuid;

use crate::client::error::CallError;
use crate::client::history::{CallHistory, CallRecord, CallStatus, DEFAULT_HISTORY_CAPACITY};
use crate::client::stats::StatsSnapshot;
use crate::load_balancer::{build_load_balancer, LoadBalancer, LoadBalancerKind};
use crate::observability::metrics;
use crate::registry::{Endpoint, EndpointRegistry};
use crate::resilience::timeouts::{attempt_budget, run_with_budget};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryPolicy};
use crate::transport::Transport;

/// Client-wide settings.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryPolicy,
    pub load_balancer: LoadBalancerKind,
    /// Use every registered endpoint when none is marked healthy.
    pub fallback_to_all_endpoints: bool,
    pub history_capacity: usize,
    /// Default per-attempt timeout; `None` leaves attempts unbounded.
    pub attempt_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryPolicy::default(),
            load_balancer: LoadBalancerKind::default(),
            fallback_to_all_endpoints: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            attempt_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Label stored in call records (e.g. `GET /users`).
    pub method: Option<String>,
    /// Overrides [`ClientOptions::attempt_timeout`] for this call.
    pub attempt_timeout: Option<Duration>,
    /// Absolute deadline for the whole call, retries included.
    pub deadline: Option<TokioInstant>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Deadline `budget` from now.
    pub fn deadline_in(mut self, budget: Duration) -> Self {
        self.deadline = Some(TokioInstant::now() + budget);
        self
    }
}

/// Resilient client for calling services by logical name.
pub struct ServiceClient<T> {
    registry: Arc<EndpointRegistry>,
    transport: T,
    balancer: Box<dyn LoadBalancer>,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    history: CallHistory,
    options: ClientOptions,
}

/// Per-call context shared by the record helpers.
struct CallContext<'a> {
    id: Uuid,
    service: &'a str,
    method: &'a str,
}

impl<T: Transport> ServiceClient<T> {
    pub fn new(registry: Arc<EndpointRegistry>, transport: T) -> Self {
        Self::with_options(registry, transport, ClientOptions::default())
    }

    pub fn with_options(registry: Arc<EndpointRegistry>, transport: T, options: ClientOptions) -> Self {
        Self {
            registry,
            transport,
            balancer: build_load_balancer(options.load_balancer),
            breakers: RwLock::new(HashMap::new()),
            history: CallHistory::new(options.history_capacity),
            options,
        }
    }

    /// Replace the balancer built from [`ClientOptions::load_balancer`].
    pub fn with_load_balancer(mut self, balancer: Box<dyn LoadBalancer>) -> Self {
        self.balancer = balancer;
        self
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    pub fn register_endpoint(&self, service: &str, host: &str, port: u16, weight: u32) {
        self.registry
            .register(Endpoint::new(service, host, port).with_weight(weight));
    }

    pub fn deregister_endpoint(&self, service: &str, host: &str, port: u16) {
        self.registry.deregister(service, host, port);
    }

    /// Breaker for `service`, created on first use.
    pub fn breaker(&self, service: &str) -> Arc<CircuitBreaker> {
        if let Some(cb) = self
            .breakers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(service)
        {
            return cb.clone();
        }

        let mut breakers = self
            .breakers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        breakers
            .entry(service.to_string())
            .or_insert_with(|| {
                tracing::debug!(service = %service, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(service, self.options.circuit_breaker.clone()))
            })
            .clone()
    }

    /// Current breaker state; `Closed` for services never called.
    pub fn breaker_state(&self, service: &str) -> CircuitState {
        self.breakers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(service)
            .map_or(CircuitState::Closed, |cb| cb.state())
    }

    /// Call `service` with `request`, retrying transient failures.
    pub async fn call(
        &self,
        service: &str,
        request: &T::Request,
        options: &CallOptions,
    ) -> Result<T::Response, CallError> {
        let call = CallContext {
            id: Uuid::new_v4(),
            service,
            method: options.method.as_deref().unwrap_or("call"),
        };
        let started = Instant::now();

        // 1. Circuit breaker. The permit returns its half-open slot on any exit
        // that records no outcome, including this future being dropped.
        let Some(permit) = self.breaker(service).try_acquire() else {
            tracing::debug!(call_id = %call.id, service = %service, "Circuit open, rejecting call");
            let err = CallError::CircuitOpen {
                service: service.to_string(),
            };
            self.reject(&call, &err);
            return Err(err);
        };

        // 2. Candidate endpoints
        let candidates = self.candidates(service);
        if candidates.is_empty() {
            tracing::warn!(call_id = %call.id, service = %service, "No endpoints registered");
            let err = CallError::NoEndpoints {
                service: service.to_string(),
            };
            self.reject(&call, &err);
            return Err(err);
        }

        // 3. Attempt loop
        let policy = &self.options.retry;
        let attempt_timeout = options.attempt_timeout.or(self.options.attempt_timeout);
        let mut attempt: u32 = 0;

        loop {
            let Some(endpoint) = self.balancer.select(&candidates) else {
                let err = CallError::NoEndpoints {
                    service: service.to_string(),
                };
                self.reject(&call, &err);
                return Err(err);
            };
            let endpoint_url = endpoint
                .base_url()
                .map(|u| u.to_string())
                .unwrap_or_else(|_| endpoint.address());

            let attempt_start = Instant::now();
            let budget = attempt_budget(attempt_timeout, options.deadline);
            let outcome = run_with_budget(budget, self.transport.send(&endpoint, request)).await;
            let latency = attempt_start.elapsed();

            let err = match outcome {
                Ok(Ok(response)) => {
                    permit.record_success();
                    self.push(&call, endpoint_url, CallStatus::Success, attempt, latency, None);
                    metrics::record_call(service, "success", started.elapsed());
                    tracing::debug!(call_id = %call.id, endpoint = %endpoint, attempt, latency = ?latency, "Call succeeded");
                    return Ok(response);
                }
                Ok(Err(e)) => CallError::from_transport(endpoint.to_string(), e, policy),
                Err(timeout) => CallError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout,
                },
            };

            let deadline_passed = options
                .deadline
                .is_some_and(|d| TokioInstant::now() >= d);

            if !policy.should_retry(attempt, err.is_retryable()) || deadline_passed {
                tracing::warn!(
                    call_id = %call.id,
                    endpoint = %endpoint,
                    attempt,
                    error = %err,
                    "Call failed"
                );
                permit.record_failure();
                self.push(&call, endpoint_url, CallStatus::Failed, attempt, latency, Some(err.to_string()));
                metrics::record_call(service, "failure", started.elapsed());
                return Err(err);
            }

            let mut delay = policy.delay_for(attempt);
            if let Some(deadline) = options.deadline {
                delay = delay.min(deadline.saturating_duration_since(TokioInstant::now()));
            }
            tracing::info!(
                call_id = %call.id,
                endpoint = %endpoint,
                attempt,
                delay = ?delay,
                error = %err,
                "Retrying call"
            );
            self.push(&call, endpoint_url, CallStatus::Retried, attempt, latency, Some(err.to_string()));
            metrics::record_retry(service);

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Aggregate stats over the in-memory history for `service`.
    pub fn stats(&self, service: &str) -> StatsSnapshot {
        StatsSnapshot::from_records(service, &self.history.for_service(service))
    }

    /// Copies of the recorded attempts for `service`, oldest first.
    pub fn history(&self, service: &str) -> Vec<CallRecord> {
        self.history.for_service(service)
    }

    fn candidates(&self, service: &str) -> Vec<Endpoint> {
        let healthy = self.registry.healthy_endpoints(service);
        if !healthy.is_empty() || !self.options.fallback_to_all_endpoints {
            return healthy;
        }

        let all = self.registry.endpoints(service);
        if !all.is_empty() {
            tracing::debug!(service = %service, count = all.len(), "No healthy endpoints, falling back to all");
        }
        all
    }

    fn reject(&self, call: &CallContext<'_>, err: &CallError) {
        self.push(call, String::new(), CallStatus::Rejected, 0, Duration::ZERO, Some(err.to_string()));
        metrics::record_call(call.service, "rejected", Duration::ZERO);
    }

    fn push(
        &self,
        call: &CallContext<'_>,
        endpoint_url: String,
        status: CallStatus,
        attempt: u32,
        latency: Duration,
        error: Option<String>,
    ) {
        self.history.push(CallRecord {
            call_id: call.id,
            service: call.service.to_string(),
            endpoint_url,
            method: call.method.to_string(),
            status,
            attempt,
            latency,
            success: status == CallStatus::Success,
            error,
            timestamp: SystemTime::now(),
        });
    }
}
