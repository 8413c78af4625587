//! Endpoint registry.
//!
//! # Responsibilities
//! - Hold the endpoints known for each service name
//! - Replace on re-registration, remove on deregistration
//! - Hand out snapshot copies for selection

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::EndpointConfig;
use crate::registry::endpoint::{Endpoint, HealthStatus};

/// Registry of service endpoints.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    /// Map of service name -> endpoints.
    services: Mutex<HashMap<String, Vec<Endpoint>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated from configuration.
    pub fn from_config(configs: &[EndpointConfig]) -> Self {
        let registry = Self::new();
        for config in configs {
            registry.register(config.to_endpoint());
        }
        registry
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Endpoint>>> {
        // Every mutation is a single push/assign/retain, so a poisoned map is still consistent.
        self.services.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an endpoint, replacing any existing one with the same (host, port).
    pub fn register(&self, endpoint: Endpoint) {
        let mut services = self.lock();
        let list = services.entry(endpoint.service.clone()).or_default();

        match list
            .iter_mut()
            .find(|e| e.same_instance(&endpoint.host, endpoint.port))
        {
            Some(existing) => {
                tracing::debug!(endpoint = %endpoint, weight = endpoint.weight, "Replacing endpoint");
                *existing = endpoint;
            }
            None => {
                tracing::info!(endpoint = %endpoint, weight = endpoint.weight, "Endpoint registered");
                list.push(endpoint);
            }
        }
    }

    /// Remove an endpoint by (host, port). No-op if absent.
    pub fn deregister(&self, service: &str, host: &str, port: u16) {
        let mut services = self.lock();
        let Some(list) = services.get_mut(service) else {
            return;
        };

        let before = list.len();
        list.retain(|e| !e.same_instance(host, port));
        if list.len() != before {
            tracing::info!(service = %service, host = %host, port, "Endpoint deregistered");
        }
        if list.is_empty() {
            services.remove(service);
        }
    }

    /// Update the health status of one endpoint.
    /// Returns false if the endpoint is not registered.
    pub fn set_status(&self, service: &str, host: &str, port: u16, status: HealthStatus) -> bool {
        let mut services = self.lock();
        let Some(endpoint) = services
            .get_mut(service)
            .and_then(|list| list.iter_mut().find(|e| e.same_instance(host, port)))
        else {
            return false;
        };

        if endpoint.status != status {
            tracing::debug!(endpoint = %endpoint, from = %endpoint.status, to = %status, "Endpoint status changed");
            endpoint.status = status;
        }
        true
    }

    /// Snapshot of all endpoints for the service (empty if unknown).
    pub fn endpoints(&self, service: &str) -> Vec<Endpoint> {
        self.lock().get(service).cloned().unwrap_or_default()
    }

    /// Snapshot of the endpoints currently marked healthy.
    pub fn healthy_endpoints(&self, service: &str) -> Vec<Endpoint> {
        self.lock()
            .get(service)
            .map(|list| list.iter().filter(|e| e.is_healthy()).cloned().collect())
            .unwrap_or_default()
    }

    /// Names of all services with at least one endpoint, sorted.
    pub fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
