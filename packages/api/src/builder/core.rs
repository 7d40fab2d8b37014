//! Core `RequestBuilder` structure and terminal methods
//!
//! The builder wraps a `RequestConfig` for one request. Errors raised while
//! configuring (an invalid URL, a bad header) are kept and reported when the
//! request is built or sent, so chains never need intermediate `?`.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use tether_client::adapter::AdapterSelection;
use tether_client::cancel::{AbortSignal, CancelToken};
use tether_client::config::RequestConfig;
use tether_client::http::{HttpResponse, ResponseData};
use tether_client::{HttpClient, Result};

/// Content type shorthands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// application/json content type
    ApplicationJson,
    /// application/x-www-form-urlencoded content type
    ApplicationFormUrlEncoded,
    /// application/octet-stream content type
    ApplicationOctetStream,
    /// text/plain content type
    TextPlain,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::ApplicationJson => "application/json",
            ContentType::ApplicationFormUrlEncoded => "application/x-www-form-urlencoded",
            ContentType::ApplicationOctetStream => "application/octet-stream",
            ContentType::TextPlain => "text/plain",
        }
    }
}

/// Fluent builder for a single request.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) client: HttpClient,
    pub(crate) config: Result<RequestConfig>,
    pub(crate) debug_enabled: bool,
}

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, config: Result<RequestConfig>) -> Self {
        Self {
            client,
            config,
            debug_enabled: false,
        }
    }

    /// Apply `f` unless an earlier step already failed.
    pub(crate) fn with_config(mut self, f: impl FnOnce(&mut RequestConfig)) -> Self {
        if let Ok(config) = &mut self.config {
            f(config);
        }
        self
    }

    /// Apply a fallible `f`; its error is reported when the request is built.
    pub(crate) fn try_with_config(mut self, f: impl FnOnce(&mut RequestConfig) -> Result<()>) -> Self {
        if let Ok(config) = &mut self.config
            && let Err(err) = f(config)
        {
            self.config = Err(err);
        }
        self
    }

    /// Log the final configuration before sending.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug_enabled = true;
        self
    }

    /// Overall timeout budget across every attempt.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.with_config(|config| config.timeout = Some(timeout))
    }

    #[must_use]
    pub fn timeout_error_message(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.with_config(|config| config.timeout_error_message = Some(message))
    }

    /// Abort the request, including any pending retry, when `signal` fires.
    #[must_use]
    pub fn signal(self, signal: AbortSignal) -> Self {
        self.with_config(|config| config.signal = Some(signal))
    }

    #[must_use]
    pub fn cancel_token(self, token: CancelToken) -> Self {
        self.with_config(|config| config.cancel_token = Some(token))
    }

    /// Append a response transform after the default JSON parsing.
    ///
    /// The default step is resolved when the request runs, so client-level
    /// transitional options still apply to it.
    #[must_use]
    pub fn transform_response<F>(self, transform: F) -> Self
    where
        F: Fn(ResponseData, &HeaderMap, Option<StatusCode>) -> Result<ResponseData>
            + Send
            + Sync
            + 'static,
    {
        self.with_config(|config| {
            config.appended_response_transforms =
                std::mem::take(&mut config.appended_response_transforms).add(transform);
        })
    }

    /// Choose the transport: an adapter name or a transport instance.
    #[must_use]
    pub fn adapter(self, adapter: impl Into<AdapterSelection>) -> Self {
        let adapter = adapter.into();
        self.with_config(|config| config.adapter = Some(adapter))
    }

    /// Decide which statuses count as success; 2xx by default.
    #[must_use]
    pub fn validate_status<F>(self, validate: F) -> Self
    where
        F: Fn(StatusCode) -> bool + Send + Sync + 'static,
    {
        self.with_config(|config| config.validate_status = Some(Arc::new(validate)))
    }

    /// The request configuration, without sending it.
    ///
    /// # Errors
    ///
    /// The first error raised while configuring.
    pub fn build(self) -> Result<RequestConfig> {
        self.config
    }

    /// Send the request through the client.
    ///
    /// # Errors
    ///
    /// Configuration errors, cancellation, or the final attempt's error.
    pub async fn send(self) -> Result<HttpResponse> {
        let config = self.config?;
        if self.debug_enabled {
            tracing::debug!(
                method = %config.method,
                url = %config.url,
                config = ?config,
                "sending request"
            );
        }
        self.client.execute(config).await
    }

    /// Send the request and deserialize the response payload.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), or a `BadResponse` error when the payload
    /// does not deserialize into `T`.
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T> {
        self.send().await?.json()
    }
}
