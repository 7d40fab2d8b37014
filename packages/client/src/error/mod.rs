pub mod classification;
pub mod constructors;
pub mod helpers;
pub mod types;

pub use classification::{RETRYABLE_NETWORK_CODES, is_cancel};
pub use constructors::*;
pub use helpers::{OperationCanceled, TimedOut, remaining_timeout};
pub use types::{Error, Kind, Result, TimeoutKind};
