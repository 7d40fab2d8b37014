//! Retry loop
//!
//! Runs the attempts of one logical request strictly in sequence:
//! dispatch, settle, decide, wait, and dispatch again until an attempt
//! succeeds, the policy declines, attempts run out or a cancellation source
//! fires. Cancellation is never retried, including during the wait between
//! attempts.

use std::sync::Arc;

use chrono::Utc;
use http::Method;

use super::attempt::{AttemptDispatcher, AttemptState};
use super::policy::RetryPolicy;
use crate::adapter::AdapterRegistry;
use crate::cancel::{ComposedSignal, TimeoutOptions, abortable_delay, compose_signals};
use crate::client::ClientStats;
use crate::config::RequestConfig;
use crate::error::{Error, Result};
use crate::http::{HttpResponse, RequestSnapshot, set_content_type_if_absent};

/// Executes requests with the retry policy their configuration asks for.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    registry: Arc<AdapterRegistry>,
    stats: Arc<ClientStats>,
}

impl RetryExecutor {
    #[must_use]
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self {
            registry,
            stats: Arc::new(ClientStats::new()),
        }
    }

    /// Record into shared statistics instead of private ones.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<ClientStats>) -> Self {
        self.stats = stats;
        self
    }

    #[must_use]
    pub fn stats(&self) -> &Arc<ClientStats> {
        &self.stats
    }

    /// Run `config` to completion.
    ///
    /// # Errors
    ///
    /// A cancellation or timeout reason, a configuration error raised before
    /// the first attempt, or the last attempt's error unchanged once retries
    /// are exhausted or declined.
    pub async fn execute(&self, config: &RequestConfig) -> Result<HttpResponse> {
        self.stats.record_request();
        let outcome = self.run(config).await;
        match &outcome {
            Ok(_) => self.stats.record_success(),
            Err(err) if err.is_canceled() => self.stats.record_cancellation(),
            Err(_) => self.stats.record_failure(),
        }
        outcome
    }

    async fn run(&self, config: &RequestConfig) -> Result<HttpResponse> {
        config.throw_if_cancellation_requested()?;
        config.validate()?;

        let snapshot = config.snapshot();
        let mut headers = config.headers.clone();
        let body = config
            .request_transforms()
            .apply(config.data.clone(), &mut headers)
            .and_then(|body| body.into_bytes())
            .map_err(|err| attach_request(err, &snapshot))?;
        if matches!(config.method, Method::POST | Method::PUT | Method::PATCH) {
            set_content_type_if_absent(&mut headers, "application/x-www-form-urlencoded");
        }

        let transport = self
            .registry
            .resolve(&config.adapter_selection())
            .map_err(|err| attach_request(err, &snapshot))?;
        let response_transforms = config.response_transforms();
        let policy = RetryPolicy::resolve(&config.retry);
        let total = policy.attempts_for(&config.method);
        let dispatcher =
            AttemptDispatcher::new(config, transport, headers, body, policy.should_reset_timeout);

        let mut state = AttemptState::new();
        let mut rng = fastrand::Rng::new();

        let last_error = loop {
            let attempt = state.begin_attempt();
            config.throw_if_cancellation_requested()?;

            self.stats.record_attempt();
            tracing::debug!(
                attempt,
                total_attempts = total,
                method = %config.method,
                url = %config.url,
                transport = dispatcher.transport_name(),
                "sending request"
            );

            let mut err = match dispatcher.dispatch(attempt, state.started_at).await {
                Ok(mut response) => {
                    let data = std::mem::take(&mut response.data);
                    response.data = response_transforms
                        .apply(data, &response.headers, Some(response.status))
                        .map_err(|err| attach_request(err, &snapshot))?;
                    return Ok(response);
                }
                Err(err) if err.is_canceled() => {
                    tracing::debug!(attempt, error = %err, "request canceled");
                    return Err(err);
                }
                Err(err) => err,
            };

            // Retry predicates see transformed error bodies.
            if let Some(response) = err.response_mut() {
                let data = std::mem::take(&mut response.data);
                response.data = response_transforms
                    .apply(data, &response.headers, Some(response.status))
                    .map_err(|err| attach_request(err, &snapshot))?;
            }

            if attempt >= total {
                break err;
            }
            if !policy.decide_retry(&err, attempt) {
                tracing::debug!(attempt, error = %err, "failure is not retryable");
                break err;
            }

            let delay = policy.compute_wait(&err, attempt, &mut rng, Utc::now());
            tracing::debug!(
                attempt,
                total_attempts = total,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying after delay"
            );
            self.stats.record_retry();

            // Only the caller's own sources may interrupt the wait; the
            // attempt timeout does not apply between attempts.
            let wait = compose_signals(config.cancellation_sources(), None, &TimeoutOptions::default());
            let wait_signal = wait.as_ref().map(ComposedSignal::signal);
            abortable_delay(delay, wait_signal.as_ref()).await?;
        };

        tracing::info!(
            attempts = state.attempt,
            total_attempts = total,
            method = %config.method,
            url = %config.url,
            error = %last_error,
            "request failed"
        );
        Err(last_error)
    }
}

fn attach_request(err: Error, snapshot: &RequestSnapshot) -> Error {
    if err.request().is_some() {
        err
    } else {
        err.with_request(snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use http::StatusCode;
    use url::Url;

    use super::*;
    use crate::adapter::{AdapterSelection, transport_fn};
    use crate::config::{RetryOptions, RetrySpec};
    use crate::error::Kind;
    use crate::http::HttpRequest;

    fn failing_executor(status: StatusCode, calls: Arc<AtomicU32>) -> RetryExecutor {
        let mut registry = AdapterRegistry::new();
        registry.register(
            "mock",
            transport_fn("mock", move |request: HttpRequest| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(HttpResponse::new(status, request.snapshot())) }
            }),
        );
        RetryExecutor::new(Arc::new(registry))
    }

    fn config(method: Method, retries: i64) -> RequestConfig {
        let url = Url::parse("http://example.test/").expect("valid url");
        let mut config = RequestConfig::new(method, url);
        config.adapter = Some(AdapterSelection::named("mock"));
        config.retry = RetrySpec::from(RetryOptions::new().retries(retries).retry_delay(std::time::Duration::ZERO));
        config
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = failing_executor(StatusCode::SERVICE_UNAVAILABLE, Arc::clone(&calls));

        let err = executor
            .execute(&config(Method::GET, 2))
            .await
            .expect_err("503 every time");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));

        let stats = executor.stats().snapshot();
        assert_eq!((stats.requests, stats.attempts, stats.retries, stats.failures), (1, 3, 2, 1));
    }

    #[tokio::test]
    async fn non_idempotent_methods_run_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = failing_executor(StatusCode::SERVICE_UNAVAILABLE, Arc::clone(&calls));

        executor
            .execute(&config(Method::POST, 5))
            .await
            .expect_err("503");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn post_defaults_form_content_type() {
        let mut registry = AdapterRegistry::new();
        registry.register(
            "mock",
            transport_fn("mock", |request: HttpRequest| async move {
                let content_type = request
                    .headers
                    .get(http::header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                Ok(HttpResponse::new(StatusCode::OK, request.snapshot()).with_data(content_type))
            }),
        );
        let executor = RetryExecutor::new(Arc::new(registry));

        let mut post = config(Method::POST, 0);
        post.data = crate::config::RequestBody::Text("a=1".into());
        let response = executor.execute(&post).await.expect("200");
        assert_eq!(
            response.data.as_text(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[tokio::test]
    async fn unsupported_scheme_fails_before_dispatch() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = failing_executor(StatusCode::OK, Arc::clone(&calls));
        let mut config = config(Method::GET, 0);
        config.url = Url::parse("ftp://example.test/file").expect("valid url");

        let err = executor.execute(&config).await.expect_err("ftp rejected");
        assert_eq!(err.kind(), Kind::InvalidUrl);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
