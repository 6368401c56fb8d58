//! Raw readings as returned by the provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One interval reported by the provider, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInterval {
    /// Interval start (inclusive)
    pub start: DateTime<Utc>,
    /// Interval end (exclusive)
    pub end: DateTime<Utc>,
    /// Value in `unit`
    pub value: f64,
    /// Unit as reported, e.g. `kWh` or `m3`
    pub unit: String,
}

impl RawInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            start,
            end,
            value,
            unit: unit.into(),
        }
    }

    /// Whether the interval starts inside `[from, to)`
    pub fn starts_within(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start >= from && self.start < to
    }
}
