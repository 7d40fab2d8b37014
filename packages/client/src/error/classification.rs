use std::error::Error as StdError;
use std::io;

use http::StatusCode;

use super::helpers::{OperationCanceled, TimedOut};
use super::types::{Error, Kind, TimeoutKind};

/// Low-level codes that indicate a transient network condition.
pub const RETRYABLE_NETWORK_CODES: [&str; 4] = ["ECONNRESET", "ETIMEDOUT", "ENOTFOUND", "EAI_AGAIN"];

impl Error {
    /// Returns true if the error came from a fired cancellation source.
    ///
    /// Cancellation is never retried.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        if matches!(self.inner.kind, Kind::Canceled) {
            return true;
        }
        self.source_chain().any(|err| err.is::<OperationCanceled>())
    }

    /// Returns true if the error is related to a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        if matches!(self.inner.kind, Kind::Timeout(_)) {
            return true;
        }

        self.source_chain().any(|err| {
            err.is::<TimedOut>()
                || err
                    .downcast_ref::<io::Error>()
                    .is_some_and(|io| io.kind() == io::ErrorKind::TimedOut)
        })
    }

    /// Returns the timeout sub-kind, if this is a timeout.
    #[must_use]
    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        match self.inner.kind {
            Kind::Timeout(kind) => Some(kind),
            _ => None,
        }
    }

    /// Returns true if the transport failed without producing a response
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self.inner.kind, Kind::Network)
    }

    /// Returns true for network-class failures worth another attempt:
    /// a generic network error, or one of [`RETRYABLE_NETWORK_CODES`]
    /// recorded on the error or on its direct cause.
    #[must_use]
    pub fn is_retryable_network(&self) -> bool {
        if self.is_network() {
            return true;
        }
        if RETRYABLE_NETWORK_CODES.contains(&self.code()) {
            return true;
        }
        self.source()
            .and_then(|cause| cause.downcast_ref::<Error>())
            .is_some_and(|cause| RETRYABLE_NETWORK_CODES.contains(&cause.code()))
    }

    /// Returns the status code, if the error carries a response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.inner.response.as_ref().map(|response| response.status)
    }

    fn source_chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(self.source(), |&err| err.source())
    }
}

/// Free-function form of [`Error::is_canceled`].
#[must_use]
pub fn is_cancel(error: &Error) -> bool {
    error.is_canceled()
}
