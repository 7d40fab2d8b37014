//! Transport adapters and their selection

pub mod registry;
pub mod transport;

pub use registry::{AdapterRegistry, AdapterSelection, DEFAULT_ADAPTERS};
pub use transport::{Transport, TransportFn, transport_fn};
