//! Configuration management for Octograph.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Octograph uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `OCTOGRAPH_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation of every section and of each `[[streams]]` entry
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use octograph::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("octograph.toml")?;
//!
//! println!("Provider: {}", config.octopus.base_url);
//! println!("InfluxDB: {}", config.influxdb.url);
//! for stream in config.meter_streams()? {
//!     println!("Stream: {} ({})", stream.id, stream.kind);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run flag
//! - [`OctopusConfig`] - Provider URL, API key, paging, rate limit and retry
//! - [`StreamConfig`] - One meter stream, optionally with a [`TariffConfig`]
//! - [`InfluxDbConfig`] - Database URL, credentials and retry
//! - [`ScheduleConfig`] - Poll interval, windows and parallelism
//! - [`StateConfig`] - Watermark persistence backend
//! - [`LoggingConfig`] - Console format and optional file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [octopus]
//! api_key = "${OCTOPUS_API_KEY}"
//! account = "A-1234ABCD"
//!
//! [[streams]]
//! kind = "electricity_consumption"
//! meter_point = "1200012345678"
//! serial_number = "21L1234567"
//!
//! [influxdb]
//! url = "http://localhost:8086"
//! token = "${INFLUXDB_TOKEN}"
//! org = "home"
//! bucket = "energy"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, split_list};
pub use schema::{
    parse_start_from, ApplicationConfig, InfluxDbConfig, LoggingConfig, OctographConfig,
    OctopusConfig, RetryConfig, ScheduleConfig, ScheduleMode, StateBackend, StateConfig,
    StreamConfig, TariffConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
