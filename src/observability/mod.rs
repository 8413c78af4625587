//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, breakers, client:
//!     → tracing macros (structured fields: service, endpoint, call_id)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
