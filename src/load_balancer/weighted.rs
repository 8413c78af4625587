//! Weighted random load balancing strategy.

use rand::Rng;

use crate::load_balancer::LoadBalancer;
use crate::registry::Endpoint;

/// Weighted random selector.
/// Draws in `[1, total_weight]` and walks cumulative weights, so a
/// zero-weight endpoint is never picked while any weight is positive.
#[derive(Debug, Default)]
pub struct Weighted;

impl Weighted {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for Weighted {
    fn select(&self, endpoints: &[Endpoint]) -> Option<Endpoint> {
        if endpoints.is_empty() {
            return None;
        }

        let mut rng = rand::thread_rng();
        let total: u64 = endpoints.iter().map(|e| u64::from(e.weight)).sum();

        if total == 0 {
            // All weights zero: uniform
            return endpoints.get(rng.gen_range(0..endpoints.len())).cloned();
        }

        let draw = rng.gen_range(1..=total);
        let mut cumulative = 0u64;
        for endpoint in endpoints {
            cumulative += u64::from(endpoint.weight);
            if cumulative >= draw {
                return Some(endpoint.clone());
            }
        }

        // Unreachable: cumulative reaches total on the last element
        endpoints.last().cloned()
    }
}
