//! Core HTTP client
//!
//! The client owns its defaults, its adapter registry and its statistics.
//! Cloning is cheap and clones share the registry and statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::configuration::ClientDefaults;
use super::stats::ClientStats;
use crate::config::RequestConfig;
use crate::error::Result;
use crate::http::HttpResponse;
use crate::retry::RetryExecutor;

/// HTTP client running requests through the retry loop.
#[derive(Debug, Clone)]
pub struct HttpClient {
    defaults: Arc<ClientDefaults>,
    executor: RetryExecutor,
    created_at: Instant,
}

impl HttpClient {
    pub(crate) fn from_parts(defaults: ClientDefaults, executor: RetryExecutor) -> Self {
        Self {
            defaults: Arc::new(defaults),
            executor,
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn defaults(&self) -> &ClientDefaults {
        &self.defaults
    }

    /// Statistics shared by every clone of this client.
    #[must_use]
    pub fn stats(&self) -> Arc<ClientStats> {
        Arc::clone(self.executor.stats())
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Execute `config` after filling its unset fields from the client
    /// defaults.
    ///
    /// # Errors
    ///
    /// See [`RetryExecutor::execute`].
    pub async fn execute(&self, config: RequestConfig) -> Result<HttpResponse> {
        let config = self.defaults.apply(config);
        self.executor.execute(&config).await
    }
}
