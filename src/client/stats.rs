//! On-demand call statistics.

use serde::Serialize;
use std::time::Duration;

use crate::client::history::{CallRecord, CallStatus};

/// Aggregate view of a service's recent calls.
///
/// Counts are per call, not per attempt: retried attempts are left out.
/// Rejected calls count as failed but carry no latency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub service: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub rejected: usize,
    /// successful / total, 0.0 with no calls.
    pub success_rate: f64,
    pub avg_latency: Duration,
    pub max_latency: Duration,
    pub min_latency: Duration,
}

impl StatsSnapshot {
    pub fn from_records(service: &str, records: &[CallRecord]) -> Self {
        let mut stats = StatsSnapshot {
            service: service.to_string(),
            ..Default::default()
        };

        let mut latency_sum = Duration::ZERO;
        let mut timed = 0u32;
        let mut min_latency: Option<Duration> = None;

        for record in records.iter().filter(|r| r.service == service && r.status.is_final()) {
            stats.total += 1;
            match record.status {
                CallStatus::Success => stats.successful += 1,
                CallStatus::Rejected => {
                    stats.failed += 1;
                    stats.rejected += 1;
                    continue;
                }
                _ => stats.failed += 1,
            }

            latency_sum += record.latency;
            timed += 1;
            stats.max_latency = stats.max_latency.max(record.latency);
            min_latency = Some(min_latency.map_or(record.latency, |m| m.min(record.latency)));
        }

        if stats.total > 0 {
            stats.success_rate = stats.successful as f64 / stats.total as f64;
        }
        if timed > 0 {
            stats.avg_latency = latency_sum / timed;
        }
        stats.min_latency = min_latency.unwrap_or_default();
        stats
    }
}
