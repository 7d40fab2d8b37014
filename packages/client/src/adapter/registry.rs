//! Adapter selection with preference ordering
//!
//! The registry is owned by a client and is read-only once the client is
//! built, so resolution needs no locking.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

use super::transport::Transport;
use crate::error::{self, Result};

/// Names tried, in order, when a request does not choose a transport.
pub const DEFAULT_ADAPTERS: [&str; 2] = ["http", "fetch"];

/// Which transport a request should use.
#[derive(Clone)]
pub enum AdapterSelection {
    /// Preference list; the first registered name wins
    Named(Vec<String>),
    /// A transport supplied with the request itself
    Custom(Arc<dyn Transport>),
}

impl Default for AdapterSelection {
    fn default() -> Self {
        Self::Named(DEFAULT_ADAPTERS.iter().map(|name| (*name).to_owned()).collect())
    }
}

impl AdapterSelection {
    /// Prefer a single named adapter.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(vec![name.into()])
    }
}

impl From<&str> for AdapterSelection {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<Arc<dyn Transport>> for AdapterSelection {
    fn from(transport: Arc<dyn Transport>) -> Self {
        Self::Custom(transport)
    }
}

impl fmt::Debug for AdapterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(names) => f.debug_tuple("Named").field(names).finish(),
            Self::Custom(transport) => f.debug_tuple("Custom").field(&transport.name()).finish(),
        }
    }
}

/// Transports known to a client, keyed by lower-cased name.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    transports: HashMap<String, Arc<dyn Transport>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `transport` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl AsRef<str>, transport: Arc<dyn Transport>) {
        self.transports
            .insert(name.as_ref().trim().to_ascii_lowercase(), transport);
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.transports.contains_key(name.trim().to_ascii_lowercase().as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    /// Pick the transport for a request.
    ///
    /// # Errors
    ///
    /// Returns `NotSupported` when no preferred name is registered.
    pub fn resolve(&self, selection: &AdapterSelection) -> Result<Arc<dyn Transport>> {
        let names = match selection {
            AdapterSelection::Custom(transport) => return Ok(Arc::clone(transport)),
            AdapterSelection::Named(names) => names,
        };

        names
            .iter()
            .find_map(|name| {
                self.transports
                    .get(name.trim().to_ascii_lowercase().as_str())
                    .cloned()
            })
            .ok_or_else(|| {
                let tried = names.join(", ");
                tracing::debug!(adapters = %tried, "no registered adapter matched");
                if names.is_empty() {
                    error::not_supported("There is no suitable adapter to dispatch the request")
                } else {
                    error::not_supported(format!(
                        "There is no suitable adapter to dispatch the request: none of [{tried}] is available"
                    ))
                }
            })
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.transports.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("AdapterRegistry").field("transports", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::adapter::transport_fn;
    use crate::error::Kind;
    use crate::http::HttpResponse;

    fn named(name: &'static str) -> Arc<dyn Transport> {
        transport_fn(name, |request: crate::http::HttpRequest| async move {
            Ok(HttpResponse::new(StatusCode::OK, request.snapshot()))
        })
    }

    #[test]
    fn first_registered_preference_wins() {
        let mut registry = AdapterRegistry::new();
        registry.register("fetch", named("fetch"));
        registry.register("HTTP", named("http"));

        let selection = AdapterSelection::Named(vec!["xhr".into(), "Http".into(), "fetch".into()]);
        let transport = registry.resolve(&selection).expect("http is registered");
        assert_eq!(transport.name(), "http");
        assert!(registry.contains("Fetch"));
    }

    #[test]
    fn unknown_adapters_are_not_supported() {
        let registry = AdapterRegistry::new();
        let err = registry
            .resolve(&AdapterSelection::named("xhr"))
            .expect_err("nothing registered");
        assert_eq!(err.kind(), Kind::NotSupported);
        assert_eq!(err.code(), "ERR_NOT_SUPPORT");
    }

    #[test]
    fn custom_transport_bypasses_registry() {
        let registry = AdapterRegistry::new();
        let transport = registry
            .resolve(&AdapterSelection::Custom(named("inline")))
            .expect("custom transport");
        assert_eq!(transport.name(), "inline");
    }
}
