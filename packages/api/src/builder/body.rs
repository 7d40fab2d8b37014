//! Request body handling
//!
//! Structured bodies stay structured until the request transforms encode
//! them, which also sets a matching content type unless one was given.

use bytes::Bytes;
use serde::Serialize;
use tether_client::config::RequestBody;
use tether_client::error;

use crate::builder::core::RequestBuilder;

impl RequestBuilder {
    /// Serialize `body` as JSON.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        let value = serde_json::to_value(body);
        self.try_with_config(|config| {
            let value = value.map_err(|e| {
                error::bad_option(format!("request body is not serializable: {e}")).with(e)
            })?;
            config.data = RequestBody::Json(value);
            Ok(())
        })
    }

    /// Send ordered `application/x-www-form-urlencoded` pairs.
    #[must_use]
    pub fn form<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.with_config(|config| config.data = RequestBody::Form(pairs))
    }

    /// Raw bytes, sent as-is.
    #[must_use]
    pub fn body(self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.with_config(|config| config.data = RequestBody::Bytes(body))
    }

    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.with_config(|config| config.data = RequestBody::Text(text))
    }
}
