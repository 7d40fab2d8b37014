use std::time::Duration;

use tokio::time::Instant;

/// A marker type to indicate that an attempt timed out.
#[derive(Debug, thiserror::Error)]
#[error("timed out")]
pub struct TimedOut;

/// A marker type to indicate that an operation was canceled.
#[derive(Debug, thiserror::Error)]
#[error("operation canceled")]
pub struct OperationCanceled;

/// Remaining part of a timeout budget that started at `start`.
///
/// Never negative: an exhausted budget yields `Duration::ZERO`.
#[must_use]
pub fn remaining_timeout(start: Instant, timeout: Duration) -> Duration {
    timeout.saturating_sub(start.elapsed())
}

/// Default message for an elapsed timeout.
#[must_use]
pub fn timeout_message(timeout: Duration) -> String {
    format!("timeout of {}ms exceeded", timeout.as_millis())
}
