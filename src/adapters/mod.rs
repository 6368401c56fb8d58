//! External system integrations for Octograph.
//!
//! This module provides adapters for the two systems Octograph talks to:
//!
//! - [`octopus`] - Octopus Energy REST API (consumption and tariff rates)
//! - [`influxdb`] - InfluxDB line protocol writer
//!
//! # Design Pattern
//!
//! The scheduler depends only on the [`ReadingSource`] and [`PointSink`] traits,
//! so tests can drive it with scripted implementations.
//!
//! ```rust,no_run
//! use octograph::adapters::{InfluxWriter, OctopusClient};
//! use octograph::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("octograph.toml")?;
//! let source = OctopusClient::new(&config.octopus)?;
//! let sink = InfluxWriter::new(&config.influxdb, config.application.dry_run)?;
//! # Ok(())
//! # }
//! ```

pub mod influxdb;
pub mod octopus;
pub mod traits;

pub use influxdb::InfluxWriter;
pub use octopus::OctopusClient;
pub use traits::{PointSink, ReadingSource, WriteResult};
