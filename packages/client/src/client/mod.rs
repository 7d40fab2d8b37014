//! HTTP client: defaults, construction and statistics

pub mod configuration;
pub mod core;
pub mod stats;

pub use configuration::{ClientBuilder, ClientDefaults};
pub use self::core::HttpClient;
pub use stats::{ClientStats, ClientStatsSnapshot};
