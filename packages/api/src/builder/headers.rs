//! Header management

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use tether_client::error;

use crate::builder::core::{ContentType, RequestBuilder};

impl RequestBuilder {
    /// Set a header, replacing earlier values of the same name.
    ///
    /// Invalid names or values are reported when the request is built.
    #[must_use]
    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        let name = key.try_into().map_err(Into::into);
        let value = value.try_into().map_err(Into::into);
        self.try_with_config(|config| {
            let (name, value) = match (name, value) {
                (Ok(name), Ok(value)) => (name, value),
                (Err(e), _) | (_, Err(e)) => {
                    return Err(error::bad_option(format!("invalid header: {e}")).with(e));
                }
            };
            config.headers.insert(name, value);
            Ok(())
        })
    }

    /// Merge `headers`, replacing earlier values of the same names.
    #[must_use]
    pub fn headers(self, headers: HeaderMap) -> Self {
        self.with_config(|config| config.headers.extend(headers))
    }

    #[must_use]
    pub fn content_type(self, content_type: ContentType) -> Self {
        self.header(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()))
    }

    #[must_use]
    pub fn accept(self, content_type: ContentType) -> Self {
        self.header(ACCEPT, HeaderValue::from_static(content_type.as_str()))
    }
}
