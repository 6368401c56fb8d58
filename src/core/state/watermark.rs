//! Watermark model for tracking ingestion progress
//!
//! One watermark per stream records the end of the latest window that was
//! fetched and written in full, plus bookkeeping about the last cycle.

use crate::domain::ids::StreamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the last cycle for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// No cycle has run yet
    #[default]
    NotStarted,
    /// A cycle is running
    InProgress,
    /// Points were written and the watermark advanced
    Completed,
    /// The provider returned nothing for the window
    NoData,
    /// The cycle failed; the watermark was left alone
    Failed,
}

impl CycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleStatus::NotStarted => "not_started",
            CycleStatus::InProgress => "in_progress",
            CycleStatus::Completed => "completed",
            CycleStatus::NoData => "no_data",
            CycleStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ingestion watermark for one stream
///
/// # Examples
///
/// ```
/// use octograph::core::state::watermark::{CycleStatus, WatermarkBuilder};
/// use octograph::domain::ids::StreamId;
/// use chrono::{TimeZone, Utc};
///
/// let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
/// let watermark = WatermarkBuilder::new(StreamId::new("electricity-1200012345678").unwrap())
///     .ingested_until(end)
///     .points_written(48)
///     .build();
///
/// assert_eq!(watermark.ingested_until, Some(end));
/// assert_eq!(watermark.last_cycle_status, CycleStatus::NotStarted);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watermark {
    /// Stream this watermark tracks
    pub stream_id: StreamId,

    /// End of the latest fully ingested window (exclusive)
    pub ingested_until: Option<DateTime<Utc>>,

    /// Total points written for this stream
    #[serde(default)]
    pub points_written: u64,

    /// When the last cycle started
    #[serde(default)]
    pub last_cycle_started_at: Option<DateTime<Utc>>,

    /// When the last cycle finished
    #[serde(default)]
    pub last_cycle_completed_at: Option<DateTime<Utc>>,

    /// Outcome of the last cycle
    #[serde(default)]
    pub last_cycle_status: CycleStatus,

    /// Error message of the last failed cycle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Watermark {
    /// Empty watermark for a stream that was never ingested
    pub fn new(stream_id: StreamId) -> Self {
        WatermarkBuilder::new(stream_id).build()
    }

    pub fn is_in_progress(&self) -> bool {
        self.last_cycle_status == CycleStatus::InProgress
    }

    pub fn is_completed(&self) -> bool {
        self.last_cycle_status == CycleStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.last_cycle_status == CycleStatus::Failed
    }

    /// Duration of the last cycle if it finished
    pub fn last_cycle_duration(&self) -> Option<chrono::Duration> {
        match (self.last_cycle_started_at, self.last_cycle_completed_at) {
            (Some(started), Some(completed)) => Some(completed - started),
            _ => None,
        }
    }

    /// Mark a cycle as started
    pub fn mark_started(&mut self, now: DateTime<Utc>) {
        self.last_cycle_started_at = Some(now);
        self.last_cycle_completed_at = None;
        self.last_cycle_status = CycleStatus::InProgress;
    }

    /// Record a successful write covering everything before `until`
    pub fn mark_completed(&mut self, until: DateTime<Utc>, points: u64, now: DateTime<Utc>) {
        self.ingested_until = Some(until);
        self.points_written += points;
        self.last_cycle_completed_at = Some(now);
        self.last_cycle_status = CycleStatus::Completed;
        self.last_error = None;
    }

    /// Record an empty window; the position does not move
    pub fn mark_no_data(&mut self, now: DateTime<Utc>) {
        self.last_cycle_completed_at = Some(now);
        self.last_cycle_status = CycleStatus::NoData;
        self.last_error = None;
    }

    /// Record a failed cycle; the position does not move
    pub fn mark_failed(&mut self, error: impl Into<String>, now: DateTime<Utc>) {
        self.last_cycle_completed_at = Some(now);
        self.last_cycle_status = CycleStatus::Failed;
        self.last_error = Some(error.into());
    }
}

/// Builder for creating Watermark instances
pub struct WatermarkBuilder {
    stream_id: StreamId,
    ingested_until: Option<DateTime<Utc>>,
    points_written: u64,
    last_cycle_started_at: Option<DateTime<Utc>>,
    last_cycle_completed_at: Option<DateTime<Utc>>,
    last_cycle_status: CycleStatus,
}

impl WatermarkBuilder {
    pub fn new(stream_id: StreamId) -> Self {
        Self {
            stream_id,
            ingested_until: None,
            points_written: 0,
            last_cycle_started_at: None,
            last_cycle_completed_at: None,
            last_cycle_status: CycleStatus::NotStarted,
        }
    }

    /// Set the ingested-until position
    pub fn ingested_until(mut self, timestamp: DateTime<Utc>) -> Self {
        self.ingested_until = Some(timestamp);
        self
    }

    /// Set the points written count
    pub fn points_written(mut self, count: u64) -> Self {
        self.points_written = count;
        self
    }

    /// Set the last cycle start
    pub fn last_cycle_started_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.last_cycle_started_at = Some(timestamp);
        self
    }

    /// Set the last cycle completion
    pub fn last_cycle_completed_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.last_cycle_completed_at = Some(timestamp);
        self
    }

    /// Set the last cycle status
    pub fn last_cycle_status(mut self, status: CycleStatus) -> Self {
        self.last_cycle_status = status;
        self
    }

    pub fn build(self) -> Watermark {
        Watermark {
            stream_id: self.stream_id,
            ingested_until: self.ingested_until,
            points_written: self.points_written,
            last_cycle_started_at: self.last_cycle_started_at,
            last_cycle_completed_at: self.last_cycle_completed_at,
            last_cycle_status: self.last_cycle_status,
            last_error: None,
        }
    }
}
