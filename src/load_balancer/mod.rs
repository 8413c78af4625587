//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceClient attempt
//!     → registry snapshot (healthy, or all as fallback)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate per candidate set)
//!         - weighted.rs (random draw proportional to weight)
//!     → Selected endpoint, or None for an empty set
//! ```
//!
//! # Design Decisions
//! - Balancers never see the registry; they select from a slice
//! - Selection runs once per attempt, so retries spread across instances
//! - Empty input is `None`, not an error

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::Endpoint;

pub mod round_robin;
pub mod weighted;

pub use round_robin::RoundRobin;
pub use weighted::Weighted;

/// Endpoint selection strategy.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    /// Pick one endpoint from the candidates, or `None` if there are none.
    fn select(&self, endpoints: &[Endpoint]) -> Option<Endpoint>;
}

/// Strategy selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerKind {
    #[default]
    RoundRobin,
    Weighted,
}

/// Build the balancer for the configured strategy.
pub fn build_load_balancer(kind: LoadBalancerKind) -> Box<dyn LoadBalancer> {
    match kind {
        LoadBalancerKind::RoundRobin => Box::new(RoundRobin::new()),
        LoadBalancerKind::Weighted => Box::new(Weighted::new()),
    }
}
