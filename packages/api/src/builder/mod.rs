//! Request builder API modules
//!
//! Provides the fluent API for configuring and sending requests.

pub mod body;
pub mod core;
pub mod headers;
pub mod methods;
pub mod retry;

pub use self::core::{ContentType, RequestBuilder};
pub use methods::Tether;
