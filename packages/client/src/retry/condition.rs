//! Retry strategies supplied by callers
//!
//! A `RetryCondition` decides whether a failed attempt should be retried and
//! a `DelayStrategy` chooses how long to wait. Both are fallible: an `Err`
//! or a panic inside a caller-supplied strategy never aborts the retry loop,
//! it falls back to "do not retry" or to the computed backoff.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use crate::error::{BoxError, Error};
use crate::http::HttpResponse;

/// Decides whether attempt `attempt` (1-based) should be followed by another.
pub trait RetryCondition: Send + Sync {
    /// # Errors
    ///
    /// An error is treated as a decision not to retry.
    fn should_retry(
        &self,
        error: &Error,
        attempt: u32,
        response: Option<&HttpResponse>,
    ) -> Result<bool, BoxError>;
}

impl<F> RetryCondition for F
where
    F: Fn(&Error, u32, Option<&HttpResponse>) -> bool + Send + Sync,
{
    fn should_retry(
        &self,
        error: &Error,
        attempt: u32,
        response: Option<&HttpResponse>,
    ) -> Result<bool, BoxError> {
        Ok(self(error, attempt, response))
    }
}

/// Chooses the wait before the retry that follows attempt `attempt`.
pub trait DelayStrategy: Send + Sync {
    /// # Errors
    ///
    /// An error makes the loop fall back to the computed backoff.
    fn delay(
        &self,
        error: &Error,
        attempt: u32,
        response: Option<&HttpResponse>,
    ) -> Result<Duration, BoxError>;
}

impl<F> DelayStrategy for F
where
    F: Fn(&Error, u32, Option<&HttpResponse>) -> Duration + Send + Sync,
{
    fn delay(
        &self,
        error: &Error,
        attempt: u32,
        response: Option<&HttpResponse>,
    ) -> Result<Duration, BoxError> {
        Ok(self(error, attempt, response))
    }
}

/// Closure-backed retry condition with its argument types spelled out.
pub fn retry_if<F>(f: F) -> F
where
    F: Fn(&Error, u32, Option<&HttpResponse>) -> bool + Send + Sync,
{
    f
}

/// Closure-backed delay strategy with its argument types spelled out.
pub fn delay_fn<F>(f: F) -> F
where
    F: Fn(&Error, u32, Option<&HttpResponse>) -> Duration + Send + Sync,
{
    f
}

/// Built-in decision: retry network-class failures that produced no
/// response, and responses with status 429 or 503.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryCondition;

impl DefaultRetryCondition {
    #[must_use]
    pub fn decide(error: &Error) -> bool {
        match error.response() {
            Some(response) => matches!(response.status.as_u16(), 429 | 503),
            None => error.is_retryable_network(),
        }
    }
}

impl RetryCondition for DefaultRetryCondition {
    fn should_retry(
        &self,
        error: &Error,
        _attempt: u32,
        _response: Option<&HttpResponse>,
    ) -> Result<bool, BoxError> {
        Ok(Self::decide(error))
    }
}

/// Runs a caller-supplied strategy, turning errors and panics into `None`.
pub(crate) fn guarded<T>(label: &'static str, f: impl FnOnce() -> Result<T, BoxError>) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(strategy = label, error = %e, "retry strategy failed");
            None
        }
        Err(_) => {
            tracing::warn!(strategy = label, "retry strategy panicked");
            None
        }
    }
}
