//! Explicit cancellation handles
//!
//! A `CancelToken` is the request-side half; the `CancelTokenSource` that
//! created it holds the `cancel` capability. Canceling twice keeps the first
//! message.

use super::signal::{AbortController, AbortSignal};
use crate::error::{self, Error, Result};

/// Request-side cancellation handle.
#[derive(Debug, Clone)]
pub struct CancelToken {
    signal: AbortSignal,
}

/// Owner of a [`CancelToken`], able to cancel it.
#[derive(Debug, Clone)]
pub struct CancelTokenSource {
    pub token: CancelToken,
    controller: AbortController,
}

impl CancelToken {
    /// Create a token together with the source that cancels it.
    #[must_use]
    pub fn source() -> CancelTokenSource {
        let controller = AbortController::new();
        CancelTokenSource {
            token: CancelToken {
                signal: controller.signal(),
            },
            controller,
        }
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.signal.is_aborted()
    }

    /// The `Canceled` error recorded by `cancel`, once requested.
    #[must_use]
    pub fn reason(&self) -> Option<Error> {
        self.signal.reason()
    }

    /// # Errors
    ///
    /// Returns the cancellation reason once cancellation has been requested.
    pub fn throw_if_requested(&self) -> Result<()> {
        self.signal.throw_if_aborted()
    }

    /// The token viewed as an abort signal, for composition.
    #[must_use]
    pub fn signal(&self) -> &AbortSignal {
        &self.signal
    }
}

impl CancelTokenSource {
    /// Request cancellation. Returns false if it was already requested.
    pub fn cancel(&self, message: Option<&str>) -> bool {
        let reason = message.map_or_else(error::canceled, error::canceled_with_message);
        self.controller.abort_with(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_records_first_message() {
        let source = CancelToken::source();
        assert!(source.token.throw_if_requested().is_ok());

        assert!(source.cancel(Some("user navigated away")));
        assert!(!source.cancel(Some("ignored")));

        let err = source.token.throw_if_requested().expect_err("token was canceled");
        assert!(err.is_canceled());
        assert_eq!(err.message(), "user navigated away");
    }

    #[test]
    fn cancel_without_message_uses_default() {
        let source = CancelToken::source();
        source.cancel(None);
        assert_eq!(source.token.reason().map(|e| e.to_string()).as_deref(), Some("canceled"));
    }
}
