//! Transport trait - the boundary between the dispatch core and the wire
//!
//! A transport receives one normalized `HttpRequest` per attempt and
//! resolves with a response or an error. It should observe the request's
//! abort signal, but the attempt dispatcher cancels it regardless by
//! dropping the returned future.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};

/// Common interface for every transport implementation.
pub trait Transport: Send + Sync {
    /// Name used for adapter selection and logging.
    fn name(&self) -> &str;

    /// Execute a single attempt.
    ///
    /// Any status is a successful dispatch; status validation happens in
    /// the core. Errors should be network-class (`Error::wrap` or
    /// `error::network`) unless the transport knows better.
    fn dispatch(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse>>;
}

impl fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").field("name", &self.name()).finish()
    }
}

/// Transport backed by an async closure.
pub struct TransportFn<F> {
    name: String,
    f: F,
}

impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn dispatch(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse>> {
        (self.f)(request).boxed()
    }
}

impl<F> fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportFn").field("name", &self.name).finish()
    }
}

/// Wrap `f` as a named transport.
pub fn transport_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn Transport>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
{
    Arc::new(TransportFn {
        name: name.into(),
        f,
    })
}
