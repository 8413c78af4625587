//! Endpoint registry subsystem.
//!
//! # Data Flow
//! ```text
//! External registrar / config file
//!     → store.rs (register, deregister, set_status)
//!     → per-service endpoint list (one mutex per registry)
//!
//! Call path:
//!     ServiceClient
//!     → store.rs (healthy_endpoints, snapshot copy)
//!     → fallback to endpoints() when nothing is healthy
//! ```
//!
//! # Design Decisions
//! - Readers get copies; iteration never races a writer
//! - Endpoint identity within a service is (host, port)
//! - Health status is written by external checkers only

pub mod endpoint;
pub mod store;

pub use endpoint::{Endpoint, HealthStatus, DEFAULT_WEIGHT};
pub use store::EndpointRegistry;
