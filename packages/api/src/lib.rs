//! Tether public API
//!
//! Fluent request builder over `tether_client`: configure a request, its
//! retry policy and its cancellation sources in one chain, then send it.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use tether::{HttpClient, Tether};
//! use tether::retry::BackoffMode;
//!
//! # async fn run(client: HttpClient) -> tether::Result<()> {
//! let items: serde_json::Value = Tether::new(&client)
//!     .get("http://example.test/items")
//!     .timeout(Duration::from_secs(2))
//!     .retries(3)
//!     .backoff(BackoffMode::Linear)
//!     .send_json()
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

pub use builder::{ContentType, RequestBuilder, Tether};

// Re-export important types from the client package
pub use tether_client::{
    AbortController, AbortSignal, CancelToken, Error, HttpClient, HttpResponse, Kind, Result,
    RetryOptions, RetrySpec, adapter, cancel, config, error, http, retry,
};
