//! Request types handed to transports
//!
//! `HttpRequest` is the normalized, per-attempt description a transport
//! receives. `RequestSnapshot` is the detached copy of method, target and
//! headers that errors and responses carry instead of a reference to the
//! caller's configuration.

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method};
use url::Url;

use crate::cancel::AbortSignal;

/// Method, target and headers of a request, captured at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSnapshot {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl RequestSnapshot {
    #[must_use]
    pub fn new(method: Method, url: Url, headers: HeaderMap) -> Self {
        Self {
            method,
            url,
            headers,
        }
    }
}

/// Normalized request for a single attempt.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// Encoded body, empty when the request carries none
    pub body: Bytes,
    /// Time left for this attempt; `None` means unbounded
    pub timeout: Option<Duration>,
    /// 1-based attempt number
    pub attempt: u32,
    /// Fires when the attempt is canceled or its timeout elapses
    pub signal: Option<AbortSignal>,
}

impl HttpRequest {
    /// Detached snapshot for responses and errors.
    #[must_use]
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot::new(self.method.clone(), self.url.clone(), self.headers.clone())
    }

    /// Returns true once the attempt's signal has fired.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.signal.as_ref().is_some_and(AbortSignal::is_aborted)
    }
}
