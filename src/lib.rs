//! Resilient service-call client.
//!
//! Call a remote service by logical name. Each call goes through the
//! service's circuit breaker, picks an endpoint from the registry with the
//! configured load balancer, and retries transient failures with jittered
//! exponential backoff through an injected [`Transport`].
//!
//! ```text
//! ServiceClient::call ─▶ CircuitBreaker ─▶ EndpointRegistry ─▶ LoadBalancer
//!                                                                   │
//!        stats ◀── CallHistory ◀── record_success/failure ◀── Transport (retry loop)
//! ```

pub mod client;
pub mod config;
pub mod load_balancer;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod transport;

pub use client::{CallError, CallOptions, ClientOptions, ErrorKind, ServiceClient, StatsSnapshot};
pub use config::ClientConfig;
pub use load_balancer::{LoadBalancer, LoadBalancerKind};
pub use registry::{Endpoint, EndpointRegistry, HealthStatus};
pub use resilience::{CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryPolicy};
pub use transport::{transport_fn, Transport, TransportError};
