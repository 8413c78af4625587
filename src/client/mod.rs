//! Service client subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceClient::call(service, request, options)
//!     → CircuitBreaker::try_acquire          (reject: CircuitOpen)
//!     → EndpointRegistry::healthy_endpoints  (fallback: all endpoints)
//!     → per attempt:
//!         LoadBalancer::select → Transport::send (under timeout)
//!         → success: permit.record_success, Success record
//!         → failure: Retried record + backoff, or Failed record + permit.record_failure
//!     → history.rs (bounded ring buffer)
//!     → stats.rs (on-demand aggregation)
//! ```

pub mod error;
pub mod history;
pub mod service_client;
pub mod stats;

pub use error::{CallError, ErrorKind};
pub use history::{CallHistory, CallRecord, CallStatus};
pub use service_client::{CallOptions, ClientOptions, ServiceClient};
pub use stats::StatsSnapshot;
