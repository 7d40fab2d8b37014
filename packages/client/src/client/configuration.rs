//! Client construction and per-client defaults
//!
//! Defaults fill in whatever a request leaves unset; a request's own value
//! always wins. Headers merge key by key.

use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

use super::core::HttpClient;
use super::stats::ClientStats;
use crate::adapter::{AdapterRegistry, AdapterSelection, Transport};
use crate::config::{RequestConfig, RetrySpec, TransitionalOptions};
use crate::error::{self, Result};
use crate::retry::RetryExecutor;

/// Values applied to every request a client executes.
#[derive(Debug, Clone, Default)]
pub struct ClientDefaults {
    /// Base for relative request targets
    pub base_url: Option<Url>,
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
    pub timeout_error_message: Option<String>,
    pub retry: RetrySpec,
    pub transitional: Option<TransitionalOptions>,
    pub adapter: Option<AdapterSelection>,
}

impl ClientDefaults {
    /// # Errors
    ///
    /// Returns `InvalidUrl` for a base URL that is not `http` or `https`
    /// and `BadOption` for an empty adapter preference list.
    pub fn validate(&self) -> Result<()> {
        if let Some(base) = &self.base_url
            && !matches!(base.scheme(), "http" | "https")
        {
            return Err(error::invalid_url(format!(
                "unsupported protocol {}: in base url",
                base.scheme()
            )));
        }
        if matches!(&self.adapter, Some(AdapterSelection::Named(names)) if names.is_empty()) {
            return Err(error::bad_option("adapter preference list is empty"));
        }
        Ok(())
    }

    /// Resolve `target` against the base URL when one is configured.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` when the target cannot be parsed.
    pub fn resolve_url(&self, target: &str) -> Result<Url> {
        let parsed = match &self.base_url {
            Some(base) => base.join(target),
            None => Url::parse(target),
        };
        parsed.map_err(|e| error::invalid_url(format!("invalid url {target:?}: {e}")).with(e))
    }

    /// Fill the request's unset fields from these defaults.
    #[must_use]
    pub fn apply(&self, mut config: RequestConfig) -> RequestConfig {
        for (name, value) in &self.headers {
            if !config.headers.contains_key(name) {
                config.headers.insert(name.clone(), value.clone());
            }
        }
        if config.timeout.is_none() {
            config.timeout = self.timeout;
        }
        if config.timeout_error_message.is_none() {
            config.timeout_error_message.clone_from(&self.timeout_error_message);
        }
        if config.retry.is_unset() {
            config.retry = self.retry.clone();
        }
        if config.transitional.is_none() {
            config.transitional = self.transitional;
        }
        if config.adapter.is_none() {
            config.adapter.clone_from(&self.adapter);
        }
        config
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    defaults: ClientDefaults,
    registry: AdapterRegistry,
    stats: Option<Arc<ClientStats>>,
}

impl ClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL that relative request targets are joined onto.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` when `base` does not parse.
    pub fn base_url(mut self, base: &str) -> Result<Self> {
        let url = Url::parse(base).map_err(|e| error::invalid_url(format!("invalid base url {base:?}: {e}")).with(e))?;
        self.defaults.base_url = Some(url);
        Ok(self)
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.defaults.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.defaults.headers.extend(headers);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn timeout_error_message(mut self, message: impl Into<String>) -> Self {
        self.defaults.timeout_error_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: impl Into<RetrySpec>) -> Self {
        self.defaults.retry = retry.into();
        self
    }

    #[must_use]
    pub fn transitional(mut self, transitional: TransitionalOptions) -> Self {
        self.defaults.transitional = Some(transitional);
        self
    }

    /// Adapter preference for requests that do not choose one.
    #[must_use]
    pub fn adapter(mut self, selection: AdapterSelection) -> Self {
        self.defaults.adapter = Some(selection);
        self
    }

    /// Register a transport under its own name.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        let name = transport.name().to_owned();
        self.registry.register(name, transport);
        self
    }

    /// Register a transport under an explicit name.
    #[must_use]
    pub fn register_adapter(mut self, name: &str, transport: Arc<dyn Transport>) -> Self {
        self.registry.register(name, transport);
        self
    }

    /// Share statistics with other clients.
    #[must_use]
    pub fn stats(mut self, stats: Arc<ClientStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// # Errors
    ///
    /// Fails when the defaults do not validate.
    pub fn build(self) -> Result<HttpClient> {
        self.defaults.validate()?;
        if self.registry.is_empty() {
            tracing::debug!("client built without registered adapters");
        }
        let stats = self.stats.unwrap_or_default();
        let executor = RetryExecutor::new(Arc::new(self.registry)).with_stats(stats);
        Ok(HttpClient::from_parts(self.defaults, executor))
    }
}

impl HttpClient {
    /// Start configuring a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// A request for `target` with the client's base URL applied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` when the target cannot be resolved.
    pub fn request(&self, method: Method, target: &str) -> Result<RequestConfig> {
        let url = self.defaults().resolve_url(target)?;
        Ok(RequestConfig::new(method, url))
    }
}

impl Default for HttpClient {
    /// A client with no registered adapters; requests that do not bring
    /// their own transport fail with `ERR_NOT_SUPPORT`.
    fn default() -> Self {
        HttpClient::from_parts(
            ClientDefaults::default(),
            RetryExecutor::new(Arc::new(AdapterRegistry::new())),
        )
    }
}

#[cfg(test)]
mod tests {
    use http::header::{ACCEPT, USER_AGENT};

    use super::*;
    use crate::config::RetryOptions;
    use crate::error::Kind;

    #[test]
    fn request_values_win_over_defaults() {
        let defaults = ClientDefaults {
            headers: HeaderMap::from_iter([
                (ACCEPT, HeaderValue::from_static("application/json")),
                (USER_AGENT, HeaderValue::from_static("tether")),
            ]),
            timeout: Some(Duration::from_secs(5)),
            retry: RetrySpec::from(RetryOptions::new().retries(3)),
            ..ClientDefaults::default()
        };

        let url = Url::parse("http://example.test/").expect("valid url");
        let mut config = RequestConfig::new(Method::GET, url);
        config.headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        config.timeout = Some(Duration::from_secs(1));

        let merged = defaults.apply(config);
        assert_eq!(merged.headers[ACCEPT], "text/plain");
        assert_eq!(merged.headers[USER_AGENT], "tether");
        assert_eq!(merged.timeout, Some(Duration::from_secs(1)));
        assert!(matches!(merged.retry, RetrySpec::Options(ref options) if options.retries == Some(3)));
    }

    #[test]
    fn relative_targets_join_the_base_url() {
        let client = HttpClient::builder()
            .base_url("http://api.example.test/v1/")
            .expect("valid base")
            .build()
            .expect("valid defaults");
        let config = client.request(Method::GET, "users/7").expect("joins");
        assert_eq!(config.url.as_str(), "http://api.example.test/v1/users/7");
    }

    #[test]
    fn invalid_defaults_are_rejected() {
        let err = HttpClient::builder()
            .adapter(AdapterSelection::Named(Vec::new()))
            .build()
            .expect_err("empty preference list");
        assert_eq!(err.kind(), Kind::BadOption);

        let err = HttpClient::builder()
            .base_url("ftp://files.example.test/")
            .expect("parses")
            .build()
            .expect_err("ftp base");
        assert_eq!(err.kind(), Kind::InvalidUrl);
    }
}
