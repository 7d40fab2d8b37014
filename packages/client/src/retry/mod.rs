//! Retry logic: policy resolution, backoff, `Retry-After` and the attempt loop

pub mod attempt;
pub mod backoff;
pub mod condition;
pub mod executor;
pub mod policy;
pub mod retry_after;

pub use attempt::{AttemptDispatcher, AttemptState};
pub use backoff::{BackoffMode, DEFAULT_BASE_DELAY, JitterMode, RandomSource, compute_delay};
pub use condition::{DefaultRetryCondition, DelayStrategy, RetryCondition, delay_fn, retry_if};
pub use executor::RetryExecutor;
pub use policy::{DEFAULT_IDEMPOTENT_METHODS, DEFAULT_RETRIES, RetryPolicy};
pub use retry_after::{parse_retry_after, retry_after_delay};
