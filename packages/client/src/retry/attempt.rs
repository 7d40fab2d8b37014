//! Single-attempt dispatch
//!
//! One attempt: derive the attempt's timeout from the overall budget,
//! compose the attempt's abort signal, hand a normalized request to the
//! transport and race it against that signal, then settle the outcome
//! against the status validator. The composed signal is released on every
//! path when it goes out of scope.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::HeaderMap;
use tokio::time::Instant;

use crate::adapter::Transport;
use crate::cancel::compose_signals;
use crate::config::RequestConfig;
use crate::error::{self, Result, remaining_timeout};
use crate::http::{HttpRequest, HttpResponse};

/// Bookkeeping for one run of the retry loop.
#[derive(Debug)]
pub struct AttemptState {
    /// 1-based number of the current attempt, 0 before the first
    pub attempt: u32,
    /// Anchor for timeout budget arithmetic
    pub started_at: Instant,
}

impl AttemptState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempt: 0,
            started_at: Instant::now(),
        }
    }

    /// Advance to the next attempt and return its number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for AttemptState {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs individual attempts of one logical request.
pub struct AttemptDispatcher<'a> {
    config: &'a RequestConfig,
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    body: Bytes,
    reset_timeout: bool,
}

impl<'a> AttemptDispatcher<'a> {
    /// `headers` and `body` are the already transformed request data,
    /// reused unchanged by every attempt.
    #[must_use]
    pub fn new(
        config: &'a RequestConfig,
        transport: Arc<dyn Transport>,
        headers: HeaderMap,
        body: Bytes,
        reset_timeout: bool,
    ) -> Self {
        Self {
            config,
            transport,
            headers,
            body,
            reset_timeout,
        }
    }

    #[must_use]
    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Timeout for an attempt starting now.
    ///
    /// `None` when the request has no budget. Unless the policy resets the
    /// timeout per attempt, the budget shrinks by the time already spent and
    /// an exhausted budget yields zero, which fires immediately.
    #[must_use]
    pub fn attempt_timeout(&self, started_at: Instant) -> Option<Duration> {
        let budget = self.config.timeout_budget()?;
        if self.reset_timeout {
            Some(budget)
        } else {
            Some(remaining_timeout(started_at, budget))
        }
    }

    /// Execute attempt number `attempt`.
    ///
    /// # Errors
    ///
    /// The abort reason when a cancellation source or the attempt timeout
    /// fires first, the transport's error, or a status error carrying the
    /// response when the status fails validation.
    pub async fn dispatch(&self, attempt: u32, started_at: Instant) -> Result<HttpResponse> {
        let timeout = self.attempt_timeout(started_at);
        let composed = compose_signals(
            self.config.cancellation_sources(),
            timeout,
            &self.config.timeout_options(),
        );
        let signal = composed.as_ref().map(|composed| composed.signal());

        let request = HttpRequest {
            method: self.config.method.clone(),
            url: self.config.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            timeout,
            attempt,
            signal: signal.clone(),
        };
        let snapshot = request.snapshot();

        tracing::trace!(
            attempt,
            transport = self.transport.name(),
            timeout_ms = timeout.map(|timeout| timeout.as_millis() as u64),
            "dispatching attempt"
        );

        let outcome = match &signal {
            // An exhausted budget or an earlier abort never reaches the transport.
            Some(signal) if signal.is_aborted() => Err(signal.reason().unwrap_or_else(error::canceled)),
            Some(signal) => {
                tokio::select! {
                    biased;
                    reason = signal.aborted() => Err(reason),
                    outcome = self.transport.dispatch(request) => outcome,
                }
            }
            None => self.transport.dispatch(request).await,
        };

        // A transport that noticed the abort may report it in its own terms;
        // the composed reason is authoritative.
        let outcome = match outcome {
            Err(_) if signal.as_ref().is_some_and(|signal| signal.is_aborted()) => {
                Err(signal.as_ref().and_then(|signal| signal.reason()).unwrap_or_else(error::canceled))
            }
            other => other,
        };

        drop(composed);

        match outcome {
            Ok(response) if self.config.is_status_valid(response.status) => Ok(response),
            Ok(response) => Err(error::status_code(response)),
            Err(err) if err.request().is_none() => Err(err.with_request(snapshot)),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for AttemptDispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptDispatcher")
            .field("transport", &self.transport.name())
            .field("method", &self.config.method)
            .field("url", &self.config.url.as_str())
            .field("reset_timeout", &self.reset_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use http::{Method, StatusCode};
    use url::Url;

    use super::*;
    use crate::adapter::transport_fn;
    use crate::cancel::AbortController;
    use crate::error::{Kind, TimeoutKind};

    fn config() -> RequestConfig {
        let url = Url::parse("http://example.test/items").expect("valid url");
        RequestConfig::new(Method::GET, url)
    }

    fn status_transport(status: StatusCode) -> Arc<dyn Transport> {
        transport_fn("mock", move |request: HttpRequest| async move {
            Ok(HttpResponse::new(status, request.snapshot()))
        })
    }

    fn dispatcher(config: &RequestConfig, transport: Arc<dyn Transport>, reset: bool) -> AttemptDispatcher<'_> {
        AttemptDispatcher::new(config, transport, HeaderMap::new(), Bytes::new(), reset)
    }

    #[tokio::test(start_paused = true)]
    async fn budget_shrinks_with_elapsed_time() {
        let mut config = config();
        config.timeout = Some(Duration::from_millis(300));
        let shrinking = dispatcher(&config, status_transport(StatusCode::OK), false);
        let resetting = dispatcher(&config, status_transport(StatusCode::OK), true);

        let started = Instant::now();
        tokio::time::advance(Duration::from_millis(120)).await;
        assert_eq!(shrinking.attempt_timeout(started), Some(Duration::from_millis(180)));
        assert_eq!(resetting.attempt_timeout(started), Some(Duration::from_millis(300)));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(shrinking.attempt_timeout(started), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_times_out_before_a_ready_transport() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let transport = transport_fn("mock", move |request: HttpRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(HttpResponse::new(StatusCode::OK, request.snapshot())) }
        });
        let mut config = config();
        config.timeout = Some(Duration::from_millis(100));

        let started = Instant::now();
        tokio::time::advance(Duration::from_millis(1000)).await;
        let err = dispatcher(&config, transport, false)
            .dispatch(2, started)
            .await
            .expect_err("budget already spent");
        assert_eq!(err.kind(), Kind::Timeout(TimeoutKind::Aborted));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_timeout_is_unbounded() {
        let mut config = config();
        config.timeout = Some(Duration::ZERO);
        let dispatcher = dispatcher(&config, status_transport(StatusCode::OK), false);
        assert_eq!(dispatcher.attempt_timeout(Instant::now()), None);
    }

    #[tokio::test]
    async fn failing_status_becomes_error_with_response() {
        let config = config();
        let err = dispatcher(&config, status_transport(StatusCode::SERVICE_UNAVAILABLE), false)
            .dispatch(1, Instant::now())
            .await
            .expect_err("503 fails validation");
        assert_eq!(err.kind(), Kind::BadResponse);
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.message(), "Request failed with status code 503");

        let err = dispatcher(&config, status_transport(StatusCode::NOT_FOUND), false)
            .dispatch(1, Instant::now())
            .await
            .expect_err("404 fails validation");
        assert_eq!(err.code(), "ERR_BAD_REQUEST");
    }

    #[tokio::test]
    async fn custom_validator_accepts_any_status() {
        let mut config = config();
        config.validate_status = Some(Arc::new(|_: StatusCode| true));
        let response = dispatcher(&config, status_transport(StatusCode::NOT_FOUND), false)
            .dispatch(1, Instant::now())
            .await
            .expect("validator accepts 404");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cancels_a_transport_that_ignores_the_signal() {
        let mut config = config();
        config.timeout = Some(Duration::from_millis(50));
        let hanging = transport_fn("hang", |_request: HttpRequest| async move {
            std::future::pending::<Result<HttpResponse>>().await
        });

        let err = dispatcher(&config, hanging, false)
            .dispatch(1, Instant::now())
            .await
            .expect_err("times out");
        assert_eq!(err.kind(), Kind::Timeout(TimeoutKind::Aborted));
        assert_eq!(err.message(), "timeout of 50ms exceeded");
        assert!(err.request().is_some());
    }

    #[tokio::test]
    async fn attempt_signal_is_released_after_dispatch() {
        let controller = AbortController::new();
        let mut config = config();
        config.signal = Some(controller.signal());
        let seen = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&seen);
        let transport = transport_fn("observe", move |request: HttpRequest| {
            observed.store(request.attempt, Ordering::SeqCst);
            let has_signal = request.signal.is_some();
            async move {
                assert!(has_signal);
                Ok(HttpResponse::new(StatusCode::OK, request.snapshot()))
            }
        });

        dispatcher(&config, transport, false)
            .dispatch(3, Instant::now())
            .await
            .expect("success");
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(controller.signal().listener_count(), 0);
    }
}
