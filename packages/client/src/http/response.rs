//! HTTP response types
//!
//! A transport produces an `HttpResponse` whose `data` starts out as raw
//! bytes or text; the response transform chain turns it into its final shape
//! (JSON by default) both on success and before a failed attempt's retry
//! decision.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;

use super::request::RequestSnapshot;
use crate::error::{self, Result};

/// Response payload at any stage of the transform pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResponseData {
    /// No payload
    #[default]
    Empty,
    /// Raw payload as received
    Bytes(Bytes),
    /// Payload decoded as text
    Text(String),
    /// Payload parsed as JSON
    Json(serde_json::Value),
}

impl ResponseData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            ResponseData::Empty => true,
            ResponseData::Bytes(bytes) => bytes.is_empty(),
            ResponseData::Text(text) => text.is_empty(),
            ResponseData::Json(_) => false,
        }
    }

    /// Parsed JSON value, if the payload has been parsed.
    #[must_use]
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Textual view of a raw or text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            ResponseData::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

impl From<&'static str> for ResponseData {
    fn from(text: &'static str) -> Self {
        ResponseData::Text(text.to_owned())
    }
}

impl From<String> for ResponseData {
    fn from(text: String) -> Self {
        ResponseData::Text(text)
    }
}

impl From<Bytes> for ResponseData {
    fn from(bytes: Bytes) -> Self {
        ResponseData::Bytes(bytes)
    }
}

impl From<serde_json::Value> for ResponseData {
    fn from(value: serde_json::Value) -> Self {
        ResponseData::Json(value)
    }
}

/// Normalized response: status, headers, payload and the originating request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub data: ResponseData,
    pub request: RequestSnapshot,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: StatusCode, request: RequestSnapshot) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            data: ResponseData::Empty,
            request,
        }
    }

    /// Add a header, ignoring names or values that are not valid HTTP.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: impl Into<ResponseData>) -> Self {
        self.data = data.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the (already transformed) payload.
    ///
    /// # Errors
    ///
    /// Returns a `BadResponse` error when the payload is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let parsed = match &self.data {
            ResponseData::Json(value) => serde_json::from_value(value.clone()),
            ResponseData::Text(text) => serde_json::from_str(text),
            ResponseData::Bytes(bytes) => serde_json::from_slice(bytes),
            ResponseData::Empty => serde_json::from_value(serde_json::Value::Null),
        };
        parsed.map_err(|e| error::bad_response(e).with_request(self.request.clone()))
    }
}
