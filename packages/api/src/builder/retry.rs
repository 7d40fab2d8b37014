//! Retry options
//!
//! Each option overrides one field of the request's retry policy and leaves
//! the rest at their defaults. `retry` replaces the whole specification.

use std::time::Duration;

use tether_client::config::{RequestConfig, RetryOptions, RetrySpec};
use tether_client::http::HttpResponse;
use tether_client::retry::{BackoffMode, JitterMode};
use tether_client::Error;

use crate::builder::core::RequestBuilder;

impl RequestBuilder {
    /// Replace the retry specification.
    #[must_use]
    pub fn retry(self, retry: impl Into<RetrySpec>) -> Self {
        let retry = retry.into();
        self.with_config(|config| config.retry = retry)
    }

    fn retry_option(self, f: impl FnOnce(RetryOptions) -> RetryOptions) -> Self {
        self.with_config(|config| config.retry = RetrySpec::Options(f(take_options(config))))
    }

    /// Retries after the first attempt.
    #[must_use]
    pub fn retries(self, retries: u32) -> Self {
        self.retry_option(|options| options.retries(i64::from(retries)))
    }

    #[must_use]
    pub fn backoff(self, mode: BackoffMode) -> Self {
        self.retry_option(|options| options.backoff(mode))
    }

    #[must_use]
    pub fn jitter(self, mode: JitterMode) -> Self {
        self.retry_option(|options| options.jitter(mode))
    }

    #[must_use]
    pub fn base_delay(self, base: Duration) -> Self {
        self.retry_option(|options| options.base_delay(base))
    }

    /// Methods eligible for retry, case-insensitive.
    #[must_use]
    pub fn retry_methods<I, S>(self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retry_option(|options| options.methods(methods))
    }

    /// Replace the default retry condition.
    #[must_use]
    pub fn retry_condition<F>(self, condition: F) -> Self
    where
        F: Fn(&Error, u32, Option<&HttpResponse>) -> bool + Send + Sync + 'static,
    {
        self.retry_option(|options| options.retry_condition(condition))
    }

    /// Fixed wait between attempts instead of the computed backoff.
    #[must_use]
    pub fn retry_delay(self, delay: Duration) -> Self {
        self.retry_option(|options| options.retry_delay(delay))
    }

    /// Wait chosen per failed attempt.
    #[must_use]
    pub fn retry_delay_with<F>(self, strategy: F) -> Self
    where
        F: Fn(&Error, u32, Option<&HttpResponse>) -> Duration + Send + Sync + 'static,
    {
        self.retry_option(|options| options.retry_delay_with(strategy))
    }

    #[must_use]
    pub fn respect_retry_after(self, respect: bool) -> Self {
        self.retry_option(|options| options.respect_retry_after(respect))
    }

    #[must_use]
    pub fn max_retry_after(self, max: Duration) -> Self {
        self.retry_option(|options| options.max_retry_after(max))
    }

    /// Give every attempt the full timeout instead of what is left of it.
    #[must_use]
    pub fn reset_timeout_per_attempt(self, reset: bool) -> Self {
        self.retry_option(|options| options.should_reset_timeout(reset))
    }
}

fn take_options(config: &mut RequestConfig) -> RetryOptions {
    match std::mem::take(&mut config.retry) {
        RetrySpec::Options(options) => options,
        RetrySpec::Unset | RetrySpec::Flag(_) => RetryOptions::new(),
    }
}
