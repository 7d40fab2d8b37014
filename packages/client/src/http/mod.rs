//! HTTP request and response types exchanged with transports

pub mod headers;
pub mod request;
pub mod response;

pub use headers::*;
pub use request::*;
pub use response::*;
