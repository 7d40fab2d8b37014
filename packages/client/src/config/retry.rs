//! Retry Configuration Module
//!
//! Raw, caller-facing retry options exactly as supplied: absent, a boolean,
//! or an object of optional fields. Nothing here is validated;
//! `RetryPolicy::resolve` turns a `RetrySpec` into a fully populated policy
//! and falls back to defaults for unusable values.
//!
//! The object form deserializes from JSON using the option names
//! `retries`, `retryDelay` (alias `delay`, milliseconds), `backoff`,
//! `jitter`, `baseDelay`, `methods`, `respectRetryAfter`, `maxRetryAfter`
//! and `shouldResetTimeout`. Predicates and delay functions can only be set
//! programmatically.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::retry::backoff::{BackoffMode, JitterMode};
use crate::retry::condition::{DelayStrategy, RetryCondition};

/// Retry option as supplied by the caller.
#[derive(Clone, Default, Deserialize)]
#[serde(untagged)]
pub enum RetrySpec {
    /// No retry configuration
    #[default]
    Unset,
    /// `false` disables retries, `true` selects the default policy
    Flag(bool),
    /// Field-wise overrides of the default policy
    Options(RetryOptions),
}

impl RetrySpec {
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, RetrySpec::Unset)
    }
}

impl From<bool> for RetrySpec {
    fn from(enabled: bool) -> Self {
        RetrySpec::Flag(enabled)
    }
}

impl From<RetryOptions> for RetrySpec {
    fn from(options: RetryOptions) -> Self {
        RetrySpec::Options(options)
    }
}

impl fmt::Debug for RetrySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrySpec::Unset => f.write_str("Unset"),
            RetrySpec::Flag(enabled) => f.debug_tuple("Flag").field(enabled).finish(),
            RetrySpec::Options(options) => f.debug_tuple("Options").field(options).finish(),
        }
    }
}

/// Explicit delay between attempts, overriding the computed backoff.
#[derive(Clone)]
pub enum RetryDelay {
    /// Same wait before every retry
    Fixed(Duration),
    /// Caller-supplied function of the failed attempt
    Strategy(Arc<dyn DelayStrategy>),
}

impl fmt::Debug for RetryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryDelay::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            RetryDelay::Strategy(_) => f.write_str("Strategy(..)"),
        }
    }
}

/// Field-wise retry overrides. `None` means "use the default".
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryOptions {
    /// Number of retries after the first attempt; invalid values fall back to 0
    #[serde(deserialize_with = "lenient_count")]
    pub retries: Option<i64>,
    /// Custom retry predicate, replacing the default condition
    #[serde(skip)]
    pub retry_condition: Option<Arc<dyn RetryCondition>>,
    #[serde(alias = "delay", deserialize_with = "lenient_delay")]
    pub retry_delay: Option<RetryDelay>,
    #[serde(deserialize_with = "lenient")]
    pub backoff: Option<BackoffMode>,
    #[serde(deserialize_with = "lenient")]
    pub jitter: Option<JitterMode>,
    /// Base of the backoff computation
    #[serde(deserialize_with = "lenient_millis")]
    pub base_delay: Option<Duration>,
    /// HTTP methods eligible for retry, case-insensitive
    #[serde(deserialize_with = "lenient")]
    pub methods: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub respect_retry_after: Option<bool>,
    /// Upper bound for a server-requested `Retry-After` delay
    #[serde(deserialize_with = "lenient_millis")]
    pub max_retry_after: Option<Duration>,
    /// Give every attempt the full timeout instead of the remaining budget
    #[serde(deserialize_with = "lenient")]
    pub should_reset_timeout: Option<bool>,
}

impl RetryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn retries(mut self, retries: i64) -> Self {
        self.retries = Some(retries);
        self
    }

    #[must_use]
    pub fn retry_condition<C: RetryCondition + 'static>(mut self, condition: C) -> Self {
        self.retry_condition = Some(Arc::new(condition));
        self
    }

    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(RetryDelay::Fixed(delay));
        self
    }

    #[must_use]
    pub fn retry_delay_with<D: DelayStrategy + 'static>(mut self, strategy: D) -> Self {
        self.retry_delay = Some(RetryDelay::Strategy(Arc::new(strategy)));
        self
    }

    #[must_use]
    pub fn backoff(mut self, mode: BackoffMode) -> Self {
        self.backoff = Some(mode);
        self
    }

    #[must_use]
    pub fn jitter(mut self, mode: JitterMode) -> Self {
        self.jitter = Some(mode);
        self
    }

    #[must_use]
    pub fn base_delay(mut self, base: Duration) -> Self {
        self.base_delay = Some(base);
        self
    }

    #[must_use]
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = Some(respect);
        self
    }

    #[must_use]
    pub fn max_retry_after(mut self, max: Duration) -> Self {
        self.max_retry_after = Some(max);
        self
    }

    #[must_use]
    pub fn should_reset_timeout(mut self, reset: bool) -> Self {
        self.should_reset_timeout = Some(reset);
        self
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("retries", &self.retries)
            .field("retry_condition", &self.retry_condition.as_ref().map(|_| ".."))
            .field("retry_delay", &self.retry_delay)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("base_delay", &self.base_delay)
            .field("methods", &self.methods)
            .field("respect_retry_after", &self.respect_retry_after)
            .field("max_retry_after", &self.max_retry_after)
            .field("should_reset_timeout", &self.should_reset_timeout)
            .finish()
    }
}

/// Any value that fails to deserialize as `T` becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Integral numbers pass through, even negative ones, so that resolution can
/// apply its fallback; fractions and non-numbers become `None`.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && n.fract() == 0.0)
            .map(|n| n as i64)
    }))
}

fn millis(value: &serde_json::Value) -> Option<Duration> {
    value
        .as_f64()
        .filter(|ms| ms.is_finite() && *ms >= 0.0)
        .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(millis(&value))
}

fn lenient_delay<'de, D>(deserializer: D) -> Result<Option<RetryDelay>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(millis(&value).map(RetryDelay::Fixed))
}
