//! Request and response data transforms
//!
//! Transforms run in registration order. Response transforms see the data of
//! successful responses and, separately, of error responses before the retry
//! decision, so retry predicates can inspect parsed bodies.

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};

use crate::config::request::RequestBody;
use crate::error::Result;
use crate::http::ResponseData;

pub mod json;

pub use json::{JsonRequest, JsonResponse};

/// Transforms response data: `(data, headers, status) -> data'`.
pub trait ResponseTransform: Send + Sync {
    /// # Errors
    ///
    /// A failed transform rejects the request with the returned error.
    fn transform(
        &self,
        data: ResponseData,
        headers: &HeaderMap,
        status: Option<StatusCode>,
    ) -> Result<ResponseData>;
}

impl<F> ResponseTransform for F
where
    F: Fn(ResponseData, &HeaderMap, Option<StatusCode>) -> Result<ResponseData> + Send + Sync,
{
    fn transform(
        &self,
        data: ResponseData,
        headers: &HeaderMap,
        status: Option<StatusCode>,
    ) -> Result<ResponseData> {
        self(data, headers, status)
    }
}

/// Transforms the request body before the first attempt; may set headers.
pub trait RequestTransform: Send + Sync {
    /// # Errors
    ///
    /// A failed transform rejects the request before any attempt.
    fn transform(&self, body: RequestBody, headers: &mut HeaderMap) -> Result<RequestBody>;
}

impl<F> RequestTransform for F
where
    F: Fn(RequestBody, &mut HeaderMap) -> Result<RequestBody> + Send + Sync,
{
    fn transform(&self, body: RequestBody, headers: &mut HeaderMap) -> Result<RequestBody> {
        self(body, headers)
    }
}

/// Ordered response transforms.
#[derive(Clone, Default)]
pub struct TransformChain {
    transforms: Vec<Arc<dyn ResponseTransform>>,
}

impl TransformChain {
    /// An empty chain: data passes through untouched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default chain: JSON parsing with the given leniency.
    #[must_use]
    pub fn json(transform: JsonResponse) -> Self {
        Self::new().add(transform)
    }

    #[must_use]
    pub fn add<T: ResponseTransform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// This chain followed by every transform of `next`.
    #[must_use]
    pub fn chain(mut self, next: &TransformChain) -> Self {
        self.transforms.extend(next.transforms.iter().cloned());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// # Errors
    ///
    /// Stops at, and returns, the first transform error.
    pub fn apply(
        &self,
        mut data: ResponseData,
        headers: &HeaderMap,
        status: Option<StatusCode>,
    ) -> Result<ResponseData> {
        for transform in &self.transforms {
            data = transform.transform(data, headers, status)?;
        }
        Ok(data)
    }
}

impl fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformChain")
            .field("len", &self.transforms.len())
            .finish()
    }
}

/// Ordered request transforms.
#[derive(Clone, Default)]
pub struct RequestTransformChain {
    transforms: Vec<Arc<dyn RequestTransform>>,
}

impl RequestTransformChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add<T: RequestTransform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// # Errors
    ///
    /// Stops at, and returns, the first transform error.
    pub fn apply(&self, mut body: RequestBody, headers: &mut HeaderMap) -> Result<RequestBody> {
        for transform in &self.transforms {
            body = transform.transform(body, headers)?;
        }
        Ok(body)
    }
}

impl fmt::Debug for RequestTransformChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTransformChain")
            .field("len", &self.transforms.len())
            .finish()
    }
}
