//! One stream through one cycle
//!
//! `Idle -> Fetching -> Normalizing -> Writing -> Advancing -> Idle`, or
//! `-> Failed -> Idle` from any step before advancing. The watermark moves
//! only in `Advancing`, after the batch was accepted, and only as far as the
//! end of the last interval the provider returned. The unpublished tail of a
//! window is fetched again on a later tick.

use super::summary::{StreamOutcome, StreamReport};
use super::window::{Window, WindowDecision};
use super::Scheduler;
use crate::core::normalize::normalize_all;
use crate::domain::{MeterStream, Result};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tokio::sync::watch;

/// Pipeline phase of a stream within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Normalizing,
    Writing,
    Advancing,
    Failed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Fetching => "fetching",
            Phase::Normalizing => "normalizing",
            Phase::Writing => "writing",
            Phase::Advancing => "advancing",
            Phase::Failed => "failed",
        }
    }
}

fn enter(stream: &MeterStream, phase: Phase) {
    tracing::debug!(stream_id = %stream.id, phase = phase.as_str(), "Stream phase");
}

impl Scheduler {
    /// Run one stream: decide its window, ingest it, update its watermark
    pub(super) async fn run_stream(
        &self,
        stream: &MeterStream,
        now: DateTime<Utc>,
        start_override: Option<DateTime<Utc>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> StreamReport {
        let started = Instant::now();

        if *shutdown.borrow() {
            return finish(stream, StreamOutcome::Interrupted, None, started);
        }

        let mut watermark = self.book.lock().await.get(&stream.id);

        let window = match self.plan.decide(
            now,
            watermark.ingested_until,
            start_override,
            stream.interval,
        ) {
            WindowDecision::Fetch(window) => window,
            WindowDecision::Skip(reason) => {
                return finish(stream, StreamOutcome::Skipped { reason }, None, started);
            }
        };

        watermark.mark_started(Utc::now());

        let (outcome, covered_until) = match self.ingest(stream, window, &mut shutdown).await {
            Ok(ingested) => ingested,
            Err(e) => {
                enter(stream, Phase::Failed);
                (StreamOutcome::from_error(&e), None)
            }
        };

        let outcome = match outcome {
            StreamOutcome::Written {
                points,
                duplicates,
                dry_run: false,
            } => {
                enter(stream, Phase::Advancing);
                let until = covered_until.unwrap_or(window.end);
                if until < window.end {
                    tracing::debug!(
                        stream_id = %stream.id,
                        ingested_until = %until.to_rfc3339(),
                        window_end = %window.end.to_rfc3339(),
                        "Window only partly published"
                    );
                }
                watermark.mark_completed(until, points as u64, Utc::now());
                match self.book.lock().await.commit(watermark).await {
                    Ok(()) => StreamOutcome::Written {
                        points,
                        duplicates,
                        dry_run: false,
                    },
                    Err(e) => {
                        enter(stream, Phase::Failed);
                        StreamOutcome::from_error(&e)
                    }
                }
            }
            StreamOutcome::NoData => {
                watermark.mark_no_data(Utc::now());
                self.record_status(watermark).await;
                StreamOutcome::NoData
            }
            StreamOutcome::Failed { kind, message } => {
                watermark.mark_failed(message.clone(), Utc::now());
                self.record_status(watermark).await;
                StreamOutcome::Failed { kind, message }
            }
            other => other,
        };

        enter(stream, Phase::Idle);
        finish(stream, outcome, Some(window), started)
    }

    /// Fetch, normalize and write one window
    ///
    /// Also returns the latest interval end among the written readings,
    /// capped at the window end.
    async fn ingest(
        &self,
        stream: &MeterStream,
        window: Window,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(StreamOutcome, Option<DateTime<Utc>>)> {
        enter(stream, Phase::Fetching);

        let resolved;
        let stream = match stream.standing_charge_url() {
            Some(url) => {
                let charge = self
                    .fetch_retry
                    .run("standing_charge", shutdown, || self.source.standing_charge(url))
                    .await?;
                tracing::debug!(stream_id = %stream.id, pence_per_day = charge, "Resolved standing charge");
                resolved = stream.with_resolved_standing_charge(charge);
                &resolved
            }
            None => stream,
        };

        let mut readings = self
            .fetch_retry
            .run("fetch_intervals", shutdown, || {
                self.source
                    .fetch_intervals(stream, window.start, window.end)
            })
            .await?;

        let fetched = readings.len();
        readings.retain(|reading| window.contains(reading));
        if readings.len() < fetched {
            tracing::debug!(
                stream_id = %stream.id,
                dropped = fetched - readings.len(),
                "Dropped readings outside the window"
            );
        }

        if readings.is_empty() {
            return Ok((StreamOutcome::NoData, None));
        }

        let covered_until = readings
            .iter()
            .map(|reading| reading.end.min(window.end))
            .max();

        enter(stream, Phase::Normalizing);
        let mut points = normalize_all(stream, &readings)?;
        points.sort_by_key(|point| point.timestamp);

        enter(stream, Phase::Writing);
        let result = self
            .write_retry
            .run("write_batch", shutdown, || self.sink.write_batch(&points))
            .await?;

        let outcome = StreamOutcome::Written {
            points: result.points_written,
            duplicates: result.duplicates_collapsed,
            dry_run: self.dry_run || result.dry_run,
        };
        Ok((outcome, covered_until))
    }

    /// Persist bookkeeping for a cycle that did not advance
    async fn record_status(&self, watermark: crate::core::state::Watermark) {
        let stream_id = watermark.stream_id.clone();
        if let Err(e) = self.book.lock().await.commit(watermark).await {
            tracing::warn!(stream_id = %stream_id, error = %e, "Failed to record cycle status");
        }
    }
}

fn finish(
    stream: &MeterStream,
    outcome: StreamOutcome,
    window: Option<Window>,
    started: Instant,
) -> StreamReport {
    crate::log_stream_outcome!(&stream.id, &outcome, window.map(|w| w.as_pair()));
    StreamReport {
        stream_id: stream.id.clone(),
        outcome,
        window,
        duration: started.elapsed(),
    }
}
