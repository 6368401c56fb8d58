//! Provider API response models
//!
//! Wire types for the paginated JSON envelopes returned by the consumption and
//! tariff endpoints.

use crate::domain::{MeterStream, RawInterval, Unit};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

/// Paginated response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Total number of results across all pages
    #[serde(default)]
    pub count: Option<u64>,
    /// Absolute URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// Absolute URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// One consumption interval
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumptionRecord {
    pub consumption: f64,
    pub interval_start: DateTime<FixedOffset>,
    pub interval_end: DateTime<FixedOffset>,
}

impl ConsumptionRecord {
    /// Convert to a raw interval; the API omits units so the stream's reported
    /// unit is attached
    pub fn into_raw(self, stream: &MeterStream) -> RawInterval {
        RawInterval::new(
            self.interval_start.with_timezone(&Utc),
            self.interval_end.with_timezone(&Utc),
            self.consumption,
            stream.reported_unit.as_str(),
        )
    }
}

/// One unit rate or standing charge period
#[derive(Debug, Clone, Deserialize)]
pub struct RateRecord {
    #[serde(default)]
    pub value_exc_vat: Option<f64>,
    pub value_inc_vat: f64,
    pub valid_from: DateTime<FixedOffset>,
    /// `None` for open-ended rates
    #[serde(default)]
    pub valid_to: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl RateRecord {
    /// Convert to a raw interval in pence; an open-ended rate covers one
    /// nominal interval
    pub fn into_raw(self, stream: &MeterStream) -> RawInterval {
        let start = self.valid_from.with_timezone(&Utc);
        let end = self
            .valid_to
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(start + stream.interval);
        RawInterval::new(start, end, self.value_inc_vat, Unit::Pence.as_str())
    }
}
