// Octograph - Octopus Energy to InfluxDB bridge
// Copyright (c) 2025 Octograph Contributors
// Licensed under the MIT License

//! # Octograph - Octopus Energy to InfluxDB bridge
//!
//! Octograph polls the Octopus Energy REST API for smart-meter consumption
//! and tariff unit rates, normalizes the readings and writes them to InfluxDB
//! (1.x or 2.x) as line protocol.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** paginated interval readings with rate limiting and retries
//! - **Normalizing** readings into canonical units, with optional tariff costs
//! - **Writing** batches of points to InfluxDB
//! - **Tracking** a per-stream watermark so each cycle only asks for new data
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Scheduler, normalizer, resilience and watermark state
//! - [`adapters`] - External integrations (Octopus API, InfluxDB)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octograph::config::OctographConfig;
//! use octograph::core::scheduler::Scheduler;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OctographConfig::from_file("octograph.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//!     let scheduler = Scheduler::from_config(&config).await?;
//!     let report = scheduler.run_once(shutdown_rx).await;
//!
//!     println!("Wrote {} points", report.points_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Incremental Sync
//!
//! Each stream's watermark is the end of the last window whose points were
//! accepted by the database. The next window starts there, so a crash between
//! the write and the watermark update only repeats points that InfluxDB
//! overwrites in place.
//!
//! ## Error Handling
//!
//! Octograph uses [`domain::OctographError`] for all errors. Each error has an
//! [`domain::ErrorKind`] that decides whether it is retried:
//!
//! ```rust,no_run
//! use octograph::domain::OctographError;
//!
//! fn example() -> Result<(), OctographError> {
//!     let config = octograph::config::OctographConfig::from_file("octograph.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Octograph uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(stream_id = "electricity-1200012345678", "Starting cycle");
//! warn!(stream_id = "gas-1234567890", "No readings in window");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
