//! # Tether client core
//!
//! Request dispatch pipeline: takes a request configuration, selects a
//! transport adapter, runs the request under cancellation and timeout
//! control, and on failure decides whether, when and how to retry.
//!
//! ## Features
//!
//! - **Retry loop** with per-method eligibility and pluggable conditions
//! - **Backoff** (fixed, linear, exponential) with full or equal jitter
//! - **`Retry-After`** honoring, in seconds or HTTP-date form, with a cap
//! - **Cancellation composition** across abort signals, cancel tokens and a
//!   shrinking per-attempt timeout budget
//! - **Abortable waits** between attempts
//! - **Injectable transports** selected by preference list
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tether_client::prelude::*;
//! use tether_client::adapter::transport_fn;
//!
//! # async fn run() -> tether_client::Result<()> {
//! let client = HttpClient::builder()
//!     .transport(transport_fn("http", |request: HttpRequest| async move {
//!         Ok(HttpResponse::new(StatusCode::OK, request.snapshot()))
//!     }))
//!     .retry(RetryOptions::new().retries(3))
//!     .build()?;
//!
//! let config = client.request(Method::GET, "http://example.test/items")?;
//! let response = client.execute(config).await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod adapter;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;
pub mod transform;

// Prelude with canonical types
pub mod prelude;

pub use crate::error::{Error, Result};
pub use crate::prelude::*;
