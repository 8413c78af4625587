//! Bounded call history.
//!
//! # Responsibilities
//! - Keep the most recent call records per client
//! - Evict the oldest record when full
//! - Hand out copies for read-only aggregation

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Outcome of one recorded attempt or call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// The call succeeded on this attempt.
    Success,
    /// This attempt failed and another one followed.
    Retried,
    /// The call's final, failed attempt.
    Failed,
    /// Rejected before any transport attempt (circuit open, no endpoints).
    Rejected,
}

impl CallStatus {
    /// True for records that end a call (one per call).
    pub fn is_final(self) -> bool {
        !matches!(self, CallStatus::Retried)
    }
}

/// Immutable record of one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub call_id: Uuid,
    pub service: String,
    /// Empty when no endpoint was selected.
    pub endpoint_url: String,
    pub method: String,
    pub status: CallStatus,
    /// 0-based attempt index within the call.
    pub attempt: u32,
    pub latency: Duration,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: SystemTime,
}

/// Fixed-capacity ring buffer of [`CallRecord`]s.
#[derive(Debug)]
pub struct CallHistory {
    capacity: usize,
    records: Mutex<VecDeque<CallRecord>>,
}

impl CallHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<CallRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, record: CallRecord) {
        let mut records = self.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Copies of the records for one service, oldest first.
    pub fn for_service(&self, service: &str) -> Vec<CallRecord> {
        self.lock()
            .iter()
            .filter(|r| r.service == service)
            .cloned()
            .collect()
    }
}

impl Default for CallHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
pub(crate) fn record(service: &str, status: CallStatus, latency_ms: u64) -> CallRecord {
    CallRecord {
        call_id: Uuid::new_v4(),
        service: service.to_string(),
        endpoint_url: "http://127.0.0.1:8080/".to_string(),
        method: "GET".to_string(),
        status,
        attempt: 0,
        latency: Duration::from_millis(latency_ms),
        success: status == CallStatus::Success,
        error: None,
        timestamp: SystemTime::now(),
    }
}
