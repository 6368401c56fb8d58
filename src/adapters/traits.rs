//! Adapter traits
//!
//! The scheduler only sees these traits, so tests can substitute scripted
//! sources and recording sinks for the HTTP implementations.

use crate::domain::{MeterStream, Point, RawInterval, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Where raw readings come from
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetch every raw interval the provider has for `stream` between
    /// `window_start` and `window_end`, following pagination to the end
    ///
    /// Results are in the order the provider returned them.
    ///
    /// # Errors
    ///
    /// Returns a provider error classified as auth, not-found, transient or
    /// invalid. A failure on any page fails the whole fetch.
    async fn fetch_intervals(
        &self,
        stream: &MeterStream,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawInterval>>;

    /// Resolve a daily standing charge (pence/day) from a provider URL
    async fn standing_charge(&self, url: &str) -> Result<f64>;
}

/// Outcome of one batch write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Points handed to the sink
    pub points_received: usize,

    /// Distinct points encoded after collapsing duplicate keys
    pub points_written: usize,

    /// Points dropped because a later point had the same key
    pub duplicates_collapsed: usize,

    /// Size of the encoded body
    pub bytes: usize,

    /// Encoded but not sent
    pub dry_run: bool,
}

/// Where normalized points go
#[async_trait]
pub trait PointSink: Send + Sync {
    /// Write `points` as a single batch
    ///
    /// Points sharing a key are collapsed first; the later one wins.
    ///
    /// # Errors
    ///
    /// Returns a database error classified as write (retryable), schema or auth.
    async fn write_batch(&self, points: &[Point]) -> Result<WriteResult>;
}
