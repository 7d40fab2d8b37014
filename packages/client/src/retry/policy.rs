//! Resolved retry policy
//!
//! A `RetryPolicy` is built once per top-level request from the caller's
//! `RetrySpec` and never changes afterwards. Resolution never fails: values
//! that cannot be used fall back to the documented defaults.
//!
//! Every shape of spec defaults to zero retries. A retry count has to be
//! requested explicitly, even when retries are enabled with a bare `true`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use http::Method;

use super::backoff::{BackoffMode, DEFAULT_BASE_DELAY, JitterMode, RandomSource, compute_delay};
use super::condition::{DefaultRetryCondition, RetryCondition, guarded};
use super::retry_after::retry_after_delay;
use crate::config::retry::{RetryDelay, RetryOptions, RetrySpec};
use crate::error::Error;
use crate::http::HttpResponse;

/// Retries used when the spec does not name a usable count.
pub const DEFAULT_RETRIES: u32 = 0;

/// Methods assumed safe to repeat.
pub const DEFAULT_IDEMPOTENT_METHODS: [&str; 4] = ["get", "head", "options", "trace"];

/// Fully populated, immutable retry policy.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    /// Lower-cased names of the methods eligible for retry
    pub methods: HashSet<String>,
    pub retry_condition: Option<Arc<dyn RetryCondition>>,
    pub retry_delay: Option<RetryDelay>,
    pub should_reset_timeout: bool,
    pub respect_retry_after: bool,
    pub max_retry_after: Option<Duration>,
    pub backoff: BackoffMode,
    pub jitter: JitterMode,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            methods: DEFAULT_IDEMPOTENT_METHODS
                .iter()
                .map(|method| (*method).to_owned())
                .collect(),
            retry_condition: None,
            retry_delay: None,
            should_reset_timeout: false,
            respect_retry_after: true,
            max_retry_after: None,
            backoff: BackoffMode::default(),
            jitter: JitterMode::default(),
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Normalize a caller-supplied spec.
    #[must_use]
    pub fn resolve(spec: &RetrySpec) -> Self {
        match spec {
            RetrySpec::Unset | RetrySpec::Flag(_) => Self::default(),
            RetrySpec::Options(options) => Self::from_options(options),
        }
    }

    fn from_options(options: &RetryOptions) -> Self {
        let defaults = Self::default();

        let retries = match options.retries {
            Some(count) if count >= 0 => u32::try_from(count).unwrap_or(u32::MAX),
            Some(invalid) => {
                tracing::debug!(retries = invalid, "ignoring invalid retry count");
                DEFAULT_RETRIES
            }
            None => DEFAULT_RETRIES,
        };

        let methods = options.methods.as_ref().map_or(defaults.methods, |methods| {
            methods
                .iter()
                .map(|method| method.trim().to_ascii_lowercase())
                .collect()
        });

        Self {
            retries,
            methods,
            retry_condition: options.retry_condition.clone(),
            retry_delay: options.retry_delay.clone(),
            should_reset_timeout: options.should_reset_timeout.unwrap_or(false),
            respect_retry_after: options.respect_retry_after.unwrap_or(true),
            max_retry_after: options.max_retry_after,
            backoff: options.backoff.unwrap_or_default(),
            jitter: options.jitter.unwrap_or_default(),
            base_delay: options
                .base_delay
                .filter(|base| !base.is_zero())
                .unwrap_or(DEFAULT_BASE_DELAY),
        }
    }

    /// Whether `method` may be attempted more than once.
    #[must_use]
    pub fn is_retry_eligible(&self, method: &Method) -> bool {
        self.methods.contains(method.as_str().to_ascii_lowercase().as_str())
    }

    /// Upper bound on attempts for a request using `method`.
    #[must_use]
    pub fn attempts_for(&self, method: &Method) -> u32 {
        if self.is_retry_eligible(method) {
            self.retries.saturating_add(1)
        } else {
            1
        }
    }

    /// Consult the custom condition, or the default one when none is set.
    ///
    /// A failing custom condition declines the retry.
    #[must_use]
    pub fn decide_retry(&self, error: &Error, attempt: u32) -> bool {
        let response = error.response();
        match &self.retry_condition {
            Some(condition) => guarded("retry_condition", || {
                condition.should_retry(error, attempt, response)
            })
            .unwrap_or(false),
            None => DefaultRetryCondition::decide(error),
        }
    }

    /// Wait before the retry that follows failed attempt `attempt`.
    ///
    /// Order of preference: a respected `Retry-After` header (capped by
    /// `max_retry_after`), then the explicit `retry_delay`, then backoff.
    pub fn compute_wait<R: RandomSource + ?Sized>(
        &self,
        error: &Error,
        attempt: u32,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Duration {
        let response = error.response();

        if let Some(delay) = response.and_then(|response| self.retry_after_for(response, now)) {
            return delay;
        }

        let explicit = match &self.retry_delay {
            Some(RetryDelay::Fixed(delay)) => Some(*delay),
            Some(RetryDelay::Strategy(strategy)) => {
                guarded("retry_delay", || strategy.delay(error, attempt, response))
            }
            None => None,
        };

        explicit.unwrap_or_else(|| {
            compute_delay(attempt, self.base_delay, self.backoff, self.jitter, rng)
        })
    }

    /// Server-requested delay for `response`, if honored by this policy.
    #[must_use]
    pub fn retry_after_for(&self, response: &HttpResponse, now: DateTime<Utc>) -> Option<Duration> {
        if !self.respect_retry_after {
            return None;
        }
        let delay = retry_after_delay(&response.headers, now)?;
        Some(self.max_retry_after.map_or(delay, |max| delay.min(max)))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.iter().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("RetryPolicy")
            .field("retries", &self.retries)
            .field("methods", &methods)
            .field("retry_condition", &self.retry_condition.as_ref().map(|_| ".."))
            .field("retry_delay", &self.retry_delay)
            .field("should_reset_timeout", &self.should_reset_timeout)
            .field("respect_retry_after", &self.respect_retry_after)
            .field("max_retry_after", &self.max_retry_after)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, StatusCode};
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::error;
    use crate::http::RequestSnapshot;
    use crate::retry::condition::{delay_fn, retry_if};

    struct Midpoint;

    impl RandomSource for Midpoint {
        fn next_f64(&mut self) -> f64 {
            0.5
        }
    }

    fn resolve_json(value: serde_json::Value) -> RetryPolicy {
        let spec: RetrySpec = serde_json::from_value(value).expect("retry spec deserializes");
        RetryPolicy::resolve(&spec)
    }

    fn response(status: u16) -> HttpResponse {
        let url = Url::parse("http://example.test/").expect("valid url");
        let request = RequestSnapshot::new(Method::GET, url, HeaderMap::new());
        HttpResponse::new(StatusCode::from_u16(status).expect("valid status"), request)
    }

    #[test]
    fn absent_and_boolean_specs_resolve_to_zero_retries() {
        for value in [json!(null), json!(false), json!(true), json!({})] {
            let policy = resolve_json(value);
            assert_eq!(policy.retries, 0);
            assert_eq!(policy.attempts_for(&Method::GET), 1);
        }
    }

    #[test]
    fn object_fields_override_defaults() {
        let policy = resolve_json(json!({
            "retries": 4,
            "methods": ["GET", " Post "],
            "backoff": "linear",
            "jitter": "none",
            "baseDelay": 250,
            "delay": 40,
            "respectRetryAfter": false,
            "maxRetryAfter": 1500,
            "shouldResetTimeout": true
        }));
        assert_eq!(policy.retries, 4);
        assert!(policy.is_retry_eligible(&Method::POST));
        assert!(!policy.is_retry_eligible(&Method::HEAD));
        assert_eq!(policy.backoff, BackoffMode::Linear);
        assert_eq!(policy.jitter, JitterMode::None);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert!(matches!(policy.retry_delay, Some(RetryDelay::Fixed(d)) if d == Duration::from_millis(40)));
        assert!(!policy.respect_retry_after);
        assert_eq!(policy.max_retry_after, Some(Duration::from_millis(1500)));
        assert!(policy.should_reset_timeout);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        for retries in [json!(-1), json!(1.5), json!("three")] {
            let policy = resolve_json(json!({ "retries": retries, "backoff": "quadratic", "jitter": 7, "retryDelay": -10 }));
            assert_eq!(policy.retries, DEFAULT_RETRIES);
            assert_eq!(policy.backoff, BackoffMode::Exponential);
            assert_eq!(policy.jitter, JitterMode::Full);
            assert!(policy.retry_delay.is_none());
        }
    }

    #[test]
    fn default_condition_checks_status_and_network_codes() {
        let policy = RetryPolicy::default();
        let unavailable = error::status_code(response(503));
        let not_found = error::status_code(response(404));
        let reset = Error::wrap(std::io::Error::other("socket hang up"), Some("ECONNRESET"));
        let rejected = error::bad_option("bad header");

        assert!(policy.decide_retry(&unavailable, 1));
        assert!(policy.decide_retry(&error::status_code(response(429)), 1));
        assert!(!policy.decide_retry(&not_found, 1));
        assert!(policy.decide_retry(&reset, 1));
        assert!(!policy.decide_retry(&rejected, 1));
    }

    #[test]
    fn failing_strategies_fall_back() {
        let options = RetryOptions::new()
            .retries(2)
            .jitter(JitterMode::None)
            .backoff(BackoffMode::Fixed)
            .retry_condition(retry_if(|_, _, _| panic!("condition exploded")))
            .retry_delay_with(delay_fn(|_, _, _| panic!("delay exploded")));
        let policy = RetryPolicy::resolve(&RetrySpec::from(options));
        let err = error::status_code(response(503));

        assert!(!policy.decide_retry(&err, 1));
        assert_eq!(policy.compute_wait(&err, 1, &mut Midpoint, Utc::now()), DEFAULT_BASE_DELAY);
    }

    #[test]
    fn retry_after_precedes_explicit_delay_and_is_clamped() {
        let options = RetryOptions::new()
            .retries(1)
            .retry_delay(Duration::from_secs(5))
            .max_retry_after(Duration::from_secs(2));
        let policy = RetryPolicy::resolve(&RetrySpec::from(options));

        let immediate = error::status_code(response(503).with_header("retry-after", "0"));
        assert_eq!(policy.compute_wait(&immediate, 1, &mut Midpoint, Utc::now()), Duration::ZERO);

        let distant = error::status_code(response(429).with_header("retry-after", "120"));
        assert_eq!(policy.compute_wait(&distant, 1, &mut Midpoint, Utc::now()), Duration::from_secs(2));

        let plain = error::status_code(response(503));
        assert_eq!(policy.compute_wait(&plain, 1, &mut Midpoint, Utc::now()), Duration::from_secs(5));
    }
}
