//! Tether prelude
//!
//! The types most callers need to configure and run requests.

// Request and response types exchanged with transports
pub use crate::http::{HttpRequest, HttpResponse, RequestSnapshot, ResponseData};

// Error types
pub use crate::error::{Error, Kind, TimeoutKind, is_cancel};

// Client and configuration
pub use crate::adapter::{AdapterRegistry, AdapterSelection, Transport};
pub use crate::cancel::{AbortController, AbortSignal, CancelToken, CancelTokenSource};
pub use crate::client::{ClientBuilder, ClientStats, ClientStatsSnapshot, HttpClient};
pub use crate::config::{RequestBody, RequestConfig, RetryOptions, RetrySpec, TransitionalOptions};
pub use crate::retry::{BackoffMode, JitterMode, RetryCondition, DelayStrategy};

// HTTP standard types from http crate
pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

// URL handling
pub use url::Url;
