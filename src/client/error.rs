//! Call error taxonomy.

use std::time::Duration;
use thiserror::Error;

use crate::resilience::RetryPolicy;
use crate::transport::TransportError;

/// Coarse origin of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected by the service's circuit breaker.
    CircuitOpen,
    /// Nothing registered for the service.
    NoEndpoints,
    /// Last attempt failed at the network level.
    Transport,
    /// Last attempt exceeded its time budget.
    Timeout,
    /// The remote answered with a non-retryable error.
    BadResponse,
}

/// Errors returned by [`ServiceClient::call`](crate::client::ServiceClient::call).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("circuit open for service '{service}'")]
    CircuitOpen { service: String },

    #[error("no endpoints available for service '{service}'")]
    NoEndpoints { service: String },

    #[error("transport error from {endpoint}: {message}")]
    Transport {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    #[error("call to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("bad response from {endpoint}: {message}")]
    BadResponse {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },
}

impl CallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            CallError::NoEndpoints { .. } => ErrorKind::NoEndpoints,
            CallError::Transport { .. } => ErrorKind::Transport,
            CallError::Timeout { .. } => ErrorKind::Timeout,
            CallError::BadResponse { .. } => ErrorKind::BadResponse,
        }
    }

    /// Transport and timeout failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallError::Transport { .. } | CallError::Timeout { .. })
    }

    /// Upstream status code, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            CallError::Transport { status, .. } | CallError::BadResponse { status, .. } => *status,
            _ => None,
        }
    }

    /// Classify a transport failure against the retry policy's status list.
    pub(crate) fn from_transport(endpoint: String, err: TransportError, policy: &RetryPolicy) -> Self {
        match err {
            TransportError::Network(message) => CallError::Transport {
                endpoint,
                status: None,
                message,
            },
            TransportError::Status { code, message } if policy.is_retryable_status(code) => {
                CallError::Transport {
                    endpoint,
                    status: Some(code),
                    message: format!("status {}: {}", code, message),
                }
            }
            TransportError::Status { code, message } => CallError::BadResponse {
                endpoint,
                status: Some(code),
                message: format!("status {}: {}", code, message),
            },
            TransportError::InvalidResponse(message) => CallError::BadResponse {
                endpoint,
                status: None,
                message,
            },
        }
    }
}
