//! Poll scheduler
//!
//! Drives every configured stream through fetch, normalize and write on a
//! fixed interval (daemon mode) or exactly once. Streams run one after
//! another unless `max_parallel_streams` allows more; the provider client's
//! rate limiter is shared either way and the watermark book sits behind a
//! mutex.
//!
//! # Example
//!
//! ```no_run
//! use octograph::config::load_config;
//! use octograph::core::scheduler::Scheduler;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("octograph.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let scheduler = Scheduler::from_config(&config).await?;
//! let report = scheduler.run_once(shutdown_rx).await;
//! println!("Wrote {} points", report.points_written());
//! # Ok(())
//! # }
//! ```

pub mod cycle;
pub mod summary;
pub mod window;

pub use cycle::Phase;
pub use summary::{
    CycleReport, StreamOutcome, StreamReport, EXIT_AUTH, EXIT_CONFIG, EXIT_CYCLE_FAILED,
    EXIT_INTERRUPTED, EXIT_OK, EXIT_STARTUP,
};
pub use window::{Window, WindowDecision, WindowPlan};

use crate::adapters::{InfluxWriter, OctopusClient, PointSink, ReadingSource};
use crate::config::{OctographConfig, ScheduleConfig};
use crate::core::resilience::{wait_for_shutdown, RetryPolicy};
use crate::core::state::{create_watermark_store, Watermark, WatermarkBook};
use crate::domain::{MeterStream, OctographError, Result, StreamId};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

/// Streams selected by `schedule.streams` (all when empty)
///
/// # Errors
///
/// Returns a configuration error if a stream cannot be built or a selected
/// id does not exist.
pub fn selected_streams(config: &OctographConfig) -> Result<Vec<MeterStream>> {
    let all = config
        .meter_streams()
        .map_err(OctographError::Configuration)?;
    select(all, &config.schedule)
}

fn select(all: Vec<MeterStream>, schedule: &ScheduleConfig) -> Result<Vec<MeterStream>> {
    if schedule.streams.is_empty() {
        return Ok(all);
    }

    for wanted in &schedule.streams {
        if !all.iter().any(|s| s.id.as_str() == wanted) {
            return Err(OctographError::Configuration(format!(
                "Unknown stream '{wanted}'"
            )));
        }
    }

    Ok(all
        .into_iter()
        .filter(|s| schedule.streams.iter().any(|w| w == s.id.as_str()))
        .collect())
}

/// Drives the ingestion pipeline
pub struct Scheduler {
    streams: Vec<MeterStream>,
    source: Arc<dyn ReadingSource>,
    sink: Arc<dyn PointSink>,
    book: Mutex<WatermarkBook>,
    plan: WindowPlan,
    fetch_retry: RetryPolicy,
    write_retry: RetryPolicy,
    poll_interval: Duration,
    max_parallel_streams: usize,
    dry_run: bool,
    /// Start overrides not yet consumed by a successful write
    pending_overrides: Mutex<HashMap<StreamId, DateTime<Utc>>>,
}

impl Scheduler {
    /// Scheduler with default window, retry and timing settings
    pub fn new(
        streams: Vec<MeterStream>,
        source: Arc<dyn ReadingSource>,
        sink: Arc<dyn PointSink>,
        book: WatermarkBook,
    ) -> Self {
        let schedule = ScheduleConfig::default();
        Self {
            streams,
            source,
            sink,
            book: Mutex::new(book),
            plan: WindowPlan::from_config(&schedule),
            fetch_retry: RetryPolicy::default(),
            write_retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(schedule.poll_interval_seconds),
            max_parallel_streams: schedule.max_parallel_streams,
            dry_run: false,
            pending_overrides: Mutex::new(HashMap::new()),
        }
    }

    /// Build the production scheduler: Octopus client, InfluxDB writer and
    /// the configured watermark store
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be built or stored watermarks
    /// cannot be loaded.
    pub async fn from_config(config: &OctographConfig) -> Result<Self> {
        let streams = selected_streams(config)?;
        let start_override = config
            .schedule
            .start_override()
            .map_err(OctographError::Configuration)?;

        let source = Arc::new(OctopusClient::new(&config.octopus)?);
        let sink = Arc::new(InfluxWriter::new(
            &config.influxdb,
            config.application.dry_run,
        )?);
        let store = create_watermark_store(&config.state, &config.influxdb)?;
        let book = WatermarkBook::load(store, &streams).await?;

        tracing::info!(
            streams = streams.len(),
            mode = ?config.schedule.mode,
            dry_run = config.application.dry_run,
            start_override = ?start_override,
            "Scheduler configured"
        );

        Ok(Self::new(streams, source, sink, book)
            .with_window_plan(WindowPlan::from_config(&config.schedule))
            .with_retry_policies(
                RetryPolicy::from_config(&config.octopus.retry),
                RetryPolicy::from_config(&config.influxdb.retry),
            )
            .with_poll_interval(Duration::from_secs(config.schedule.poll_interval_seconds))
            .with_max_parallel_streams(config.schedule.max_parallel_streams)
            .with_dry_run(config.application.dry_run)
            .with_start_override(start_override))
    }

    pub fn with_window_plan(mut self, plan: WindowPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Retry policies for provider fetches and database writes
    pub fn with_retry_policies(mut self, fetch: RetryPolicy, write: RetryPolicy) -> Self {
        self.fetch_retry = fetch;
        self.write_retry = write;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_parallel_streams(mut self, max: usize) -> Self {
        self.max_parallel_streams = max.max(1);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Start every stream's next window here, ignoring stored watermarks,
    /// until that stream's first successful write
    pub fn with_start_override(mut self, start: Option<DateTime<Utc>>) -> Self {
        let pending = self.pending_overrides.get_mut();
        pending.clear();
        if let Some(start) = start {
            for stream in &self.streams {
                pending.insert(stream.id.clone(), start);
            }
        }
        self
    }

    pub fn streams(&self) -> &[MeterStream] {
        &self.streams
    }

    /// Current watermark of a stream
    pub async fn watermark(&self, stream_id: &StreamId) -> Watermark {
        self.book.lock().await.get(stream_id)
    }

    /// One pass over all streams
    pub async fn run_cycle(&self, shutdown: &watch::Receiver<bool>) -> CycleReport {
        self.run_cycle_at(Utc::now(), shutdown).await
    }

    /// One pass over all streams with windows computed at `now`
    pub async fn run_cycle_at(
        &self,
        now: DateTime<Utc>,
        shutdown: &watch::Receiver<bool>,
    ) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::new();

        if self.max_parallel_streams <= 1 {
            for stream in &self.streams {
                let stream_report = self.run_one(stream, now, shutdown.clone()).await;
                let stop = stream_report.outcome == StreamOutcome::Interrupted;
                report.push(stream_report);
                if stop {
                    break;
                }
            }
        } else {
            let mut reports: Vec<(usize, StreamReport)> = futures::stream::iter(
                self.streams.iter().enumerate(),
            )
            .map(|(index, stream)| {
                let shutdown = shutdown.clone();
                async move { (index, self.run_one(stream, now, shutdown).await) }
            })
            .buffer_unordered(self.max_parallel_streams)
            .collect()
            .await;

            reports.sort_by_key(|(index, _)| *index);
            for (_, stream_report) in reports {
                report.push(stream_report);
            }
        }

        report.with_duration(started.elapsed())
    }

    async fn run_one(
        &self,
        stream: &MeterStream,
        now: DateTime<Utc>,
        shutdown: watch::Receiver<bool>,
    ) -> StreamReport {
        let start_override = self.pending_overrides.lock().await.get(&stream.id).copied();

        let report = self.run_stream(stream, now, start_override, shutdown).await;

        if start_override.is_some()
            && matches!(report.outcome, StreamOutcome::Written { dry_run: false, .. })
        {
            self.pending_overrides.lock().await.remove(&stream.id);
        }
        report
    }

    /// Run exactly one cycle
    pub async fn run_once(&self, shutdown: watch::Receiver<bool>) -> CycleReport {
        tracing::info!(streams = self.streams.len(), "Running single cycle");
        let report = self.run_cycle(&shutdown).await;
        report.log_summary();
        report
    }

    /// Run cycles every `poll_interval` until shutdown is requested
    ///
    /// Returns the number of cycles started.
    pub async fn run_daemon(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        tracing::info!(
            streams = self.streams.len(),
            poll_interval_secs = self.poll_interval.as_secs(),
            "Starting scheduler loop"
        );

        let mut cycles = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_cycle(&shutdown).await;
            report.log_summary();
            cycles += 1;

            if report.interrupted {
                break;
            }

            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!(cycles, "Scheduler stopped");
        cycles
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("streams", &self.streams.len())
            .field("plan", &self.plan)
            .field("poll_interval", &self.poll_interval)
            .field("max_parallel_streams", &self.max_parallel_streams)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
