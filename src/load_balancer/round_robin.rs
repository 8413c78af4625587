//! Round-robin load balancing strategy.

use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::load_balancer::LoadBalancer;
use crate::registry::Endpoint;

/// Candidate sets remembered per service before the least recently used is dropped.
pub const MAX_SETS_PER_SERVICE: usize = 4;

/// Round-robin selector.
/// Keeps one rotation counter per distinct candidate set, so a set changing
/// (endpoint added, health fallback) starts its own rotation instead of
/// skewing another one. Counters are grouped by service and each group is
/// capped at [`MAX_SETS_PER_SERVICE`].
#[derive(Debug, Default)]
pub struct RoundRobin {
    rotations: DashMap<String, Vec<(u64, usize)>>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rotation counters currently held.
    pub fn key_count(&self) -> usize {
        self.rotations.iter().map(|entry| entry.value().len()).sum()
    }
}

/// Stable hash of a candidate set (service, host, port of each member, in order).
fn set_key(endpoints: &[Endpoint]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for e in endpoints {
        e.service.hash(&mut hasher);
        e.host.hash(&mut hasher);
        e.port.hash(&mut hasher);
    }
    hasher.finish()
}

impl LoadBalancer for RoundRobin {
    fn select(&self, endpoints: &[Endpoint]) -> Option<Endpoint> {
        let first = endpoints.first()?;
        let key = set_key(endpoints);

        // The entry guard serializes selections for one service.
        let mut sets = self.rotations.entry(first.service.clone()).or_default();
        let count = match sets.iter().position(|(k, _)| *k == key) {
            Some(pos) => {
                let (_, count) = sets.remove(pos);
                sets.insert(0, (key, count.wrapping_add(1)));
                count
            }
            None => {
                sets.insert(0, (key, 1));
                sets.truncate(MAX_SETS_PER_SERVICE);
                0
            }
        };

        endpoints.get(count % endpoints.len()).cloned()
    }
}
