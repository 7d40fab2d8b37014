use std::time::Duration;

use super::signal::AbortSignal;
use crate::error::Result;

/// Sleep for `duration` unless `signal` fires first.
///
/// A zero duration returns immediately without arming a timer. The timer is
/// dropped on both paths, so nothing outlives the call.
///
/// # Errors
///
/// Returns the signal's abort reason when it fires before the delay elapses,
/// including when it had already fired.
pub async fn abortable_delay(duration: Duration, signal: Option<&AbortSignal>) -> Result<()> {
    if duration.is_zero() {
        return Ok(());
    }

    let Some(signal) = signal else {
        tokio::time::sleep(duration).await;
        return Ok(());
    };

    tokio::select! {
        biased;
        reason = signal.aborted() => Err(reason),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::cancel::AbortController;

    #[tokio::test(start_paused = true)]
    async fn resolves_after_duration() {
        let controller = AbortController::new();
        let start = Instant::now();

        abortable_delay(Duration::from_millis(200), Some(&controller.signal()))
            .await
            .expect("delay should elapse");

        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_when_signal_fires() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let start = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.abort();
        });

        let err = abortable_delay(Duration::from_secs(60), Some(&signal))
            .await
            .expect_err("abort should interrupt the wait");

        assert!(err.is_canceled());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn zero_duration_ignores_fired_signal() {
        let controller = AbortController::new();
        controller.abort();
        assert!(abortable_delay(Duration::ZERO, Some(&controller.signal())).await.is_ok());
    }

    #[tokio::test]
    async fn fired_signal_rejects_immediately() {
        let controller = AbortController::new();
        controller.abort();
        let result = abortable_delay(Duration::from_secs(3600), Some(&controller.signal())).await;
        assert!(result.is_err());
    }
}
