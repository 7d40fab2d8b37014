//! Configuration for requests and clients
//!
//! Plain structs with `Default` implementations. Retry options are kept raw
//! here and resolved into a `RetryPolicy` by the retry module.

pub mod request;
pub mod retry;

pub use request::{
    RequestBody, RequestConfig, ValidateStatus, default_request_transforms,
    default_response_transforms,
};
pub use retry::{RetryDelay, RetryOptions, RetrySpec};

/// Compatibility switches inherited from older behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionalOptions {
    /// Report elapsed timeouts as `ETIMEDOUT` rather than `ECONNABORTED`
    pub clarify_timeout_error: bool,
    /// Keep unparseable JSON responses as text instead of failing
    pub silent_json_parsing: bool,
    /// Attempt JSON parsing regardless of the response content type
    pub forced_json_parsing: bool,
}

impl Default for TransitionalOptions {
    fn default() -> Self {
        Self {
            clarify_timeout_error: false,
            silent_json_parsing: true,
            forced_json_parsing: true,
        }
    }
}
