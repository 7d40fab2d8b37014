use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::http::{HttpResponse, RequestSnapshot};

/// A Result alias where the Err case is `tether_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Shared, cloneable error source.
pub(crate) type SharedSource = Arc<dyn StdError + Send + Sync>;

/// Represents every failure the dispatch pipeline can surface.
///
/// Errors are cheap to clone: the underlying cause is reference counted so an
/// abort reason can be handed to every observer of a signal without losing the
/// chain.
#[derive(Clone)]
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

#[derive(Clone)]
pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) message: String,
    pub(crate) code: Option<String>,
    pub(crate) source: Option<SharedSource>,
    pub(crate) request: Option<RequestSnapshot>,
    pub(crate) response: Option<HttpResponse>,
}

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// User or internal cancellation fired
    Canceled,
    /// A per-attempt or composed timeout elapsed
    Timeout(TimeoutKind),
    /// Transport-level failure with no response
    Network,
    /// A response was received but could not be parsed or transformed,
    /// or the server answered with a 5xx status
    BadResponse,
    /// The server answered with a non-success status outside the 5xx range
    BadRequest,
    /// An option value in the request configuration is unusable
    BadOption,
    /// No registered transport can dispatch the request
    NotSupported,
    /// The request target is not a usable URL
    InvalidUrl,
}

/// Timeout sub-kind, selected by `TransitionalOptions::clarify_timeout_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeoutKind {
    /// Reported as a connection abort (`ECONNABORTED`)
    Aborted,
    /// Reported as a timeout (`ETIMEDOUT`)
    TimedOut,
}

impl Kind {
    /// Normalized error code for this kind.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Kind::Canceled => "ERR_CANCELED",
            Kind::Timeout(TimeoutKind::Aborted) => "ECONNABORTED",
            Kind::Timeout(TimeoutKind::TimedOut) => "ETIMEDOUT",
            Kind::Network => "ERR_NETWORK",
            Kind::BadResponse => "ERR_BAD_RESPONSE",
            Kind::BadRequest => "ERR_BAD_REQUEST",
            Kind::BadOption => "ERR_BAD_OPTION",
            Kind::NotSupported => "ERR_NOT_SUPPORT",
            Kind::InvalidUrl => "ERR_INVALID_URL",
        }
    }
}

impl Error {
    pub fn new(kind: Kind, message: impl Into<String>) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                message: message.into(),
                code: None,
                source: None,
                request: None,
                response: None,
            }),
        }
    }

    /// Attach the underlying cause.
    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(Arc::from(source.into()));
        self
    }

    /// Override the normalized code with a low-level one (e.g. `ECONNRESET`).
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Error {
        self.inner.code = Some(code.into());
        self
    }

    /// Snapshot of the request this error belongs to.
    #[must_use]
    pub fn with_request(mut self, request: RequestSnapshot) -> Error {
        self.inner.request = Some(request);
        self
    }

    /// Attach the response that triggered this error.
    #[must_use]
    pub fn with_response(mut self, response: HttpResponse) -> Error {
        self.inner.response = Some(response);
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Explicit low-level code when one was recorded, otherwise the kind's code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.inner
            .code
            .as_deref()
            .unwrap_or_else(|| self.inner.kind.code())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    #[must_use]
    pub fn request(&self) -> Option<&RequestSnapshot> {
        self.inner.request.as_ref()
    }

    #[must_use]
    pub fn response(&self) -> Option<&HttpResponse> {
        self.inner.response.as_ref()
    }

    pub(crate) fn response_mut(&mut self) -> Option<&mut HttpResponse> {
        self.inner.response.as_mut()
    }

    /// Take the response out of the error, e.g. to inspect an error body.
    pub fn into_response(self) -> Option<HttpResponse> {
        self.inner.response
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("tether::Error");

        f.field("kind", &self.inner.kind);
        f.field("code", &self.code());
        f.field("message", &self.inner.message);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref request) = self.inner.request {
            f.field("method", &request.method);
            f.field("url", &request.url.as_str());
        }

        if let Some(ref response) = self.inner.response {
            f.field("status", &response.status);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.message.is_empty() {
            f.write_str(self.code())
        } else {
            f.write_str(&self.inner.message)
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
