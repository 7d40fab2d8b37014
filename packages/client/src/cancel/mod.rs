//! Cancellation primitives: abort signals, cancel tokens, signal composition
//! and the abortable delay used between retry attempts.

pub mod compose;
pub mod delay;
pub mod signal;
pub mod token;

pub use compose::{ComposedSignal, TimeoutOptions, compose_signals};
pub use delay::abortable_delay;
pub use signal::{AbortController, AbortSignal, ListenerId};
pub use token::{CancelToken, CancelTokenSource};
