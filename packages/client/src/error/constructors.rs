use std::time::Duration;

use super::helpers::{OperationCanceled, TimedOut, timeout_message};
use super::types::{Error, Kind, TimeoutKind};
use crate::http::HttpResponse;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates a `Canceled` error with the default message.
pub fn canceled() -> Error {
    canceled_with_message("canceled")
}

/// Creates a `Canceled` error carrying a caller-supplied message.
pub fn canceled_with_message(message: impl Into<String>) -> Error {
    Error::new(Kind::Canceled, message).with(OperationCanceled)
}

/// Creates a timeout error for an elapsed budget.
///
/// `clarify` selects `ETIMEDOUT` over the legacy `ECONNABORTED` classification.
pub fn timeout(timeout: Duration, message: Option<&str>, clarify: bool) -> Error {
    let kind = if clarify {
        TimeoutKind::TimedOut
    } else {
        TimeoutKind::Aborted
    };
    let message = message.map_or_else(|| timeout_message(timeout), str::to_owned);
    Error::new(Kind::Timeout(kind), message).with(TimedOut)
}

/// Creates an `Error` for a transport failure that produced no response.
pub fn network<E: Into<BoxError>>(e: E) -> Error {
    let e = e.into();
    Error::new(Kind::Network, e.to_string()).with(e)
}

/// Creates an `Error` for a response that failed parsing or transformation.
pub fn bad_response<E: Into<BoxError>>(e: E) -> Error {
    let e = e.into();
    Error::new(Kind::BadResponse, e.to_string()).with(e)
}

/// Creates an `Error` for an unusable configuration value.
pub fn bad_option(message: impl Into<String>) -> Error {
    Error::new(Kind::BadOption, message)
}

/// Creates an `Error` when no transport can serve the request.
pub fn not_supported(message: impl Into<String>) -> Error {
    Error::new(Kind::NotSupported, message)
}

/// Creates an `Error` for an unusable request target.
pub fn invalid_url(message: impl Into<String>) -> Error {
    Error::new(Kind::InvalidUrl, message)
}

/// Creates an `Error` for a response whose status failed validation.
///
/// 5xx statuses classify as `BadResponse`, everything else as `BadRequest`.
pub fn status_code(response: HttpResponse) -> Error {
    let status = response.status;
    let kind = if status.is_server_error() {
        Kind::BadResponse
    } else {
        Kind::BadRequest
    };
    let request = response.request.clone();
    Error::new(kind, format!("Request failed with status code {}", status.as_u16()))
        .with_request(request)
        .with_response(response)
}

impl Error {
    /// Wraps an arbitrary error, keeping it as the `source` and optionally
    /// recording a low-level code.
    ///
    /// An error that already is a `tether_client::Error` passes through
    /// unchanged apart from the code override.
    pub fn wrap<E>(error: E, code: Option<&str>) -> Error
    where
        E: Into<BoxError>,
    {
        let error = error.into();
        let wrapped = match error.downcast::<Error>() {
            Ok(existing) => *existing,
            Err(other) => Error::new(Kind::Network, other.to_string()).with(other),
        };
        match code {
            Some(code) => wrapped.with_code(code),
            None => wrapped,
        }
    }
}
