//! Octopus Energy API adapter
//!
//! Paginated retrieval of consumption and unit-rate intervals, with
//! process-wide request spacing.

pub mod client;
pub mod models;
pub mod rate_limit;

pub use client::OctopusClient;
pub use models::{ConsumptionRecord, Page, RateRecord};
pub use rate_limit::{MinIntervalLimiter, NoopLimiter, RateLimiter};
