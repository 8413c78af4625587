//! HTTP transport over `reqwest`.
//!
//! # Responsibilities
//! - Build the upstream URL from the selected endpoint and request path
//! - Map non-success statuses to [`TransportError::Status`]
//! - Map connection failures to [`TransportError::Network`]

use reqwest::Method;
use serde::Serialize;

use crate::registry::Endpoint;
use crate::transport::{Transport, TransportError};

/// Request forwarded to whichever endpoint is selected.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path and query relative to the endpoint root, e.g. `/v1/users?id=3`.
    pub path: String,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body.into()),
        }
    }
}

/// Successful upstream response.
#[derive(Debug, Clone, Serialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Transport sending [`HttpRequest`]s with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    type Request = HttpRequest;
    type Response = HttpResponse;

    async fn send(&self, endpoint: &Endpoint, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = endpoint
            .base_url()
            .and_then(|base| base.join(&request.path))
            .map_err(|e| TransportError::InvalidResponse(format!("bad url for {}: {}", endpoint, e)))?;

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                message: body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}
