//! Transport boundary.
//!
//! The client never speaks a wire protocol itself. A [`Transport`] is
//! injected at construction and invoked once per attempt with the endpoint
//! chosen by the load balancer.
//!
//! # Design Decisions
//! - Transports report failures as [`TransportError`]; the client classifies
//!   them for retry and breaker purposes
//! - Timeouts are enforced by the client around the transport future
//! - Closures can be used directly through [`transport_fn`]

use std::future::Future;
use std::marker::PhantomData;
use thiserror::Error;

use crate::registry::Endpoint;

pub mod http;

pub use http::{HttpRequest, HttpResponse, HttpTransport};

/// Failure reported by a transport for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, reset, DNS failure and the like.
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-success status.
    #[error("status {code}: {message}")]
    Status { code: u16, message: String },

    /// The remote answered with something that could not be used.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Executes one request against one endpoint.
pub trait Transport: Send + Sync + 'static {
    type Request: Send + Sync;
    type Response: Send;

    fn send(
        &self,
        endpoint: &Endpoint,
        request: &Self::Request,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send;
}

/// Transport built from a closure. See [`transport_fn`].
pub struct TransportFn<F, Req> {
    f: F,
    _request: PhantomData<fn(Req)>,
}

/// Wrap a closure `Fn(Endpoint, Req) -> impl Future<Output = Result<Resp, TransportError>>`
/// as a [`Transport`]. The request is cloned for every attempt.
pub fn transport_fn<F, Req>(f: F) -> TransportFn<F, Req> {
    TransportFn {
        f,
        _request: PhantomData,
    }
}

impl<F, Req, Resp, Fut> Transport for TransportFn<F, Req>
where
    F: Fn(Endpoint, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, TransportError>> + Send,
    Req: Clone + Send + Sync + 'static,
    Resp: Send,
{
    type Request = Req;
    type Response = Resp;

    fn send(
        &self,
        endpoint: &Endpoint,
        request: &Req,
    ) -> impl Future<Output = Result<Resp, TransportError>> + Send {
        (self.f)(endpoint.clone(), request.clone())
    }
}
