//! Configuration loading for the attendance ledger client.
//!
//! This module loads the backend location, request bound, cache TTLs,
//! report settings and REST paths from a YAML file.
//!
//! # Example
//!
//! ```no_run
//! use attendance_ledger::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/ledger.yaml").unwrap();
//! println!("Backend: {}", config.config().api.base_url);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{ApiConfig, CacheConfig, EndpointConfig, LedgerConfig, ReportConfig};
