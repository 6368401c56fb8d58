//! Core ingestion logic for Octograph.
//!
//! # Modules
//!
//! - [`normalize`] - Unit conversion, tariff costing and point building
//! - [`resilience`] - Retry with backoff, `Retry-After` and cancellation
//! - [`scheduler`] - Windows, per-stream pipeline, cycles and the daemon loop
//! - [`state`] - Watermarks and their persistence
//!
//! # Ingestion Workflow
//!
//! For every stream, each cycle:
//!
//! 1. **Plan**: Compute `[start, end)` from the watermark and publication lag
//! 2. **Fetch**: Follow the provider's pages for the window
//! 3. **Normalize**: Convert readings into canonical points, with costs if a tariff is set
//! 4. **Write**: Send the batch to InfluxDB as line protocol
//! 5. **Advance**: Move the watermark to the end of the last interval written once the write is accepted
//!
//! # Example
//!
//! ```rust,no_run
//! use octograph::config::load_config;
//! use octograph::core::scheduler::Scheduler;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("octograph.toml")?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let scheduler = Scheduler::from_config(&config).await?;
//! let report = scheduler.run_once(shutdown_rx).await;
//!
//! println!("Points written: {}", report.points_written());
//! println!("Exit code: {}", report.exit_code());
//! # Ok(())
//! # }
//! ```

pub mod normalize;
pub mod resilience;
pub mod scheduler;
pub mod state;
