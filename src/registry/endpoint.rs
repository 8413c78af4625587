//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single instance of a named service
//! - Carry the weight used by weighted selection
//! - Track last-known health status (set by external health checkers)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;
use url::Url;

/// Weight given to endpoints registered without one.
pub const DEFAULT_WEIGHT: u32 = 100;

/// Health status enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// A single instance of a named service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Logical service name this instance belongs to.
    pub service: String,
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Relative weight for weighted selection.
    pub weight: u32,
    /// Last-known health status.
    pub status: HealthStatus,
}

impl Endpoint {
    /// Create a new endpoint with the default weight and unknown status.
    pub fn new(service: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service: service.into(),
            host: host.into(),
            port,
            weight: DEFAULT_WEIGHT,
            status: HealthStatus::Unknown,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_status(mut self, status: HealthStatus) -> Self {
        self.status = status;
        self
    }

    /// `host:port`, with IPv6 literals bracketed (`[::1]:8080`).
    pub fn address(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Base URL (`http://host:port/`) used by HTTP transports.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}/", self.address()))
    }

    /// True if this endpoint has the same (host, port) identity as `other`.
    pub fn same_instance(&self, host: &str, port: u16) -> bool {
        self.host == host && self.port == port
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.service, self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ep = Endpoint::new("api", "10.0.0.1", 8080);
        assert_eq!(ep.weight, DEFAULT_WEIGHT);
        assert_eq!(ep.status, HealthStatus::Unknown);
        assert!(!ep.is_healthy());
        assert_eq!(ep.address(), "10.0.0.1:8080");
        assert_eq!(ep.to_string(), "api@10.0.0.1:8080");
    }

    #[test]
    fn test_base_url() {
        let ep = Endpoint::new("api", "localhost", 9000);
        let url = ep.base_url().unwrap().join("v1/users").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v1/users");
    }

    #[test]
    fn test_ipv6_host() {
        let ep = Endpoint::new("api", "::1", 8080);
        assert_eq!(ep.address(), "[::1]:8080");
        assert_eq!(ep.to_string(), "api@[::1]:8080");

        let url = ep.base_url().unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8080/");
        assert_eq!(url.join("health").unwrap().as_str(), "http://[::1]:8080/health");
    }
}
