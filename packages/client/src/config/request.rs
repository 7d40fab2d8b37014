//! Per-request configuration
//!
//! A `RequestConfig` describes one logical request. The retry loop never
//! mutates it; every attempt works from derived copies.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use super::TransitionalOptions;
use super::retry::RetrySpec;
use crate::adapter::AdapterSelection;
use crate::cancel::{AbortSignal, CancelToken, TimeoutOptions};
use crate::error::{self, Result};
use crate::http::RequestSnapshot;
use crate::transform::{JsonRequest, JsonResponse, RequestTransformChain, TransformChain};

/// Predicate deciding which statuses count as success.
pub type ValidateStatus = Arc<dyn Fn(StatusCode) -> bool + Send + Sync>;

/// Request body before the request transforms run.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Text(String),
    Json(serde_json::Value),
    /// Ordered `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Raw bytes of an encoded body.
    ///
    /// # Errors
    ///
    /// Returns `BadOption` for `Json` and `Form` bodies that no request
    /// transform has encoded.
    pub fn into_bytes(self) -> Result<Bytes> {
        match self {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Bytes(bytes) => Ok(bytes),
            RequestBody::Text(text) => Ok(Bytes::from(text)),
            RequestBody::Json(_) | RequestBody::Form(_) => Err(error::bad_option(
                "structured request body was not encoded by any request transform",
            )),
        }
    }
}

/// Description of a single logical request, retried as a unit.
#[derive(Clone)]
pub struct RequestConfig {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub data: RequestBody,
    /// Overall budget across attempts; `None` or zero is unbounded
    pub timeout: Option<Duration>,
    pub timeout_error_message: Option<String>,
    /// `None` inherits the client's options
    pub transitional: Option<TransitionalOptions>,
    pub signal: Option<AbortSignal>,
    pub cancel_token: Option<CancelToken>,
    pub retry: RetrySpec,
    /// `None` selects JSON and form encoding
    pub transform_request: Option<RequestTransformChain>,
    /// `None` selects JSON parsing driven by the transitional options
    pub transform_response: Option<TransformChain>,
    /// Run after `transform_response` or its default, whichever is in effect
    pub appended_response_transforms: TransformChain,
    /// `None` accepts 2xx statuses
    pub validate_status: Option<ValidateStatus>,
    /// `None` inherits the client's preference
    pub adapter: Option<AdapterSelection>,
}

impl RequestConfig {
    /// A GET request with default transforms and no timeout or retries.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HeaderMap::new(),
            data: RequestBody::Empty,
            timeout: None,
            timeout_error_message: None,
            transitional: None,
            signal: None,
            cancel_token: None,
            retry: RetrySpec::Unset,
            transform_request: None,
            transform_response: None,
            appended_response_transforms: TransformChain::new(),
            validate_status: None,
            adapter: None,
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidUrl` when the target cannot be parsed.
    pub fn get(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| error::invalid_url(format!("invalid url {url:?}: {e}")).with(e))?;
        Ok(Self::new(Method::GET, url))
    }

    /// The effective timeout budget; zero is treated as unbounded.
    #[must_use]
    pub fn timeout_budget(&self) -> Option<Duration> {
        self.timeout.filter(|timeout| !timeout.is_zero())
    }

    #[must_use]
    pub fn transitional(&self) -> TransitionalOptions {
        self.transitional.unwrap_or_default()
    }

    #[must_use]
    pub fn timeout_options(&self) -> TimeoutOptions {
        TimeoutOptions {
            clarify_timeout_error: self.transitional().clarify_timeout_error,
            timeout_error_message: self.timeout_error_message.clone(),
        }
    }

    /// The request transforms in effect.
    #[must_use]
    pub fn request_transforms(&self) -> RequestTransformChain {
        self.transform_request
            .clone()
            .unwrap_or_else(default_request_transforms)
    }

    /// The response transforms in effect, resolved against the
    /// transitional options at call time.
    #[must_use]
    pub fn response_transforms(&self) -> TransformChain {
        self.transform_response
            .clone()
            .unwrap_or_else(|| default_response_transforms(&self.transitional()))
            .chain(&self.appended_response_transforms)
    }

    #[must_use]
    pub fn adapter_selection(&self) -> AdapterSelection {
        self.adapter.clone().unwrap_or_default()
    }

    /// The caller's own cancellation sources: signal first, then token.
    #[must_use]
    pub fn cancellation_sources(&self) -> [Option<&AbortSignal>; 2] {
        [
            self.signal.as_ref(),
            self.cancel_token.as_ref().map(CancelToken::signal),
        ]
    }

    /// Fails fast when cancellation was requested.
    ///
    /// # Errors
    ///
    /// The cancel token's reason, or a `Canceled` error when the signal fired.
    pub fn throw_if_cancellation_requested(&self) -> Result<()> {
        if let Some(token) = &self.cancel_token {
            token.throw_if_requested()?;
        }
        if self.signal.as_ref().is_some_and(AbortSignal::is_aborted) {
            return Err(error::canceled().with_request(self.snapshot()));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_status_valid(&self, status: StatusCode) -> bool {
        match &self.validate_status {
            Some(validate) => validate(status),
            None => status.is_success(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot::new(self.method.clone(), self.url.clone(), self.headers.clone())
    }

    /// Validate the configuration before any attempt is made.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` for targets without an `http` or `https` scheme
    /// or without a host.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(error::invalid_url(format!(
                "unsupported protocol {}:",
                self.url.scheme()
            ))
            .with_request(self.snapshot()));
        }
        if self.url.host_str().is_none_or(str::is_empty) {
            return Err(error::invalid_url("url has no host").with_request(self.snapshot()));
        }
        Ok(())
    }
}

/// JSON and form encoding of structured bodies.
#[must_use]
pub fn default_request_transforms() -> RequestTransformChain {
    RequestTransformChain::new().add(JsonRequest)
}

/// JSON parsing with the leniency of `transitional`.
#[must_use]
pub fn default_response_transforms(transitional: &TransitionalOptions) -> TransformChain {
    TransformChain::json(JsonResponse::from(transitional))
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("data", &self.data)
            .field("timeout", &self.timeout)
            .field("transitional", &self.transitional)
            .field("signal", &self.signal)
            .field("cancel_token", &self.cancel_token)
            .field("retry", &self.retry)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}
