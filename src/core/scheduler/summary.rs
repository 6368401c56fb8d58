//! Cycle outcomes and reporting
//!
//! Each stream ends a cycle with one [`StreamOutcome`]; a [`CycleReport`]
//! gathers them, logs a summary and decides the exit code of a once run.

use super::window::Window;
use crate::domain::{ErrorKind, OctographError, StreamId};
use std::time::Duration;

/// Exit code for a successful once run
pub const EXIT_OK: i32 = 0;
/// Exit code for a once run with a failed stream
pub const EXIT_CYCLE_FAILED: i32 = 1;
/// Exit code for a configuration error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for a credential rejection in a once run
pub const EXIT_AUTH: i32 = 3;
/// Exit code for a fatal startup error
pub const EXIT_STARTUP: i32 = 5;
/// Exit code for a once run interrupted by a signal
///
/// A signal in daemon mode is the normal way to stop and exits with
/// [`EXIT_OK`]. A once run that is cut short did not ingest every stream,
/// so it reports the conventional SIGINT status for wrappers that chain runs.
pub const EXIT_INTERRUPTED: i32 = 130;

/// How one stream's cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// Points were written (or encoded, in dry-run mode)
    Written {
        points: usize,
        duplicates: usize,
        dry_run: bool,
    },
    /// Nothing to fetch this tick
    Skipped { reason: String },
    /// The provider returned no readings for the window
    NoData,
    /// The cycle was aborted; the watermark did not move
    Failed { kind: ErrorKind, message: String },
    /// Shutdown was requested mid-cycle
    Interrupted,
}

impl StreamOutcome {
    /// Failed outcome from an error; cancellation maps to `Interrupted`
    pub fn from_error(error: &OctographError) -> Self {
        match error.kind() {
            ErrorKind::Cancelled => StreamOutcome::Interrupted,
            kind => StreamOutcome::Failed {
                kind,
                message: error.to_string(),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamOutcome::Written { dry_run: true, .. } => "dry_run",
            StreamOutcome::Written { .. } => "written",
            StreamOutcome::Skipped { .. } => "skipped",
            StreamOutcome::NoData => "no_data",
            StreamOutcome::Failed { .. } => "failed",
            StreamOutcome::Interrupted => "interrupted",
        }
    }

    /// Points sent to the database (zero for dry runs)
    pub fn points_written(&self) -> usize {
        match self {
            StreamOutcome::Written {
                points,
                dry_run: false,
                ..
            } => *points,
            _ => 0,
        }
    }

    /// Points dropped because a later reading shared their key
    pub fn duplicates_collapsed(&self) -> usize {
        match self {
            StreamOutcome::Written { duplicates, .. } => *duplicates,
            _ => 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StreamOutcome::Failed { .. })
    }
}

/// One stream's result within a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    pub stream_id: StreamId,
    pub outcome: StreamOutcome,
    pub window: Option<Window>,
    pub duration: Duration,
}

/// Result of one pass over all streams
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub streams: Vec<StreamReport>,
    pub duration: Duration,
    /// Shutdown stopped the cycle before every stream ran
    pub interrupted: bool,
}

impl CycleReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: StreamReport) {
        if report.outcome == StreamOutcome::Interrupted {
            self.interrupted = true;
        }
        self.streams.push(report);
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Outcome recorded for a stream
    pub fn outcome(&self, stream_id: &StreamId) -> Option<&StreamOutcome> {
        self.streams
            .iter()
            .find(|r| &r.stream_id == stream_id)
            .map(|r| &r.outcome)
    }

    pub fn points_written(&self) -> usize {
        self.streams.iter().map(|r| r.outcome.points_written()).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StreamReport> {
        self.streams.iter().filter(|r| r.outcome.is_failure())
    }

    pub fn is_successful(&self) -> bool {
        !self.interrupted && self.failures().next().is_none()
    }

    fn count(&self, label: &str) -> usize {
        self.streams
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }

    /// Exit code for a once run
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            return EXIT_INTERRUPTED;
        }
        let mut failures = self.failures().peekable();
        if failures.peek().is_none() {
            return EXIT_OK;
        }
        if failures.any(|r| matches!(r.outcome, StreamOutcome::Failed { kind: ErrorKind::Auth, .. })) {
            EXIT_AUTH
        } else {
            EXIT_CYCLE_FAILED
        }
    }

    pub fn log_summary(&self) {
        let failed = self.failures().count();
        tracing::info!(
            streams = self.streams.len(),
            written = self.count("written"),
            dry_run = self.count("dry_run"),
            no_data = self.count("no_data"),
            skipped = self.count("skipped"),
            failed,
            interrupted = self.interrupted,
            points_written = self.points_written(),
            duration_ms = self.duration.as_millis() as u64,
            "Cycle completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProviderError;

    fn report(id: &str, outcome: StreamOutcome) -> StreamReport {
        StreamReport {
            stream_id: StreamId::new(id).unwrap(),
            outcome,
            window: None,
            duration: Duration::from_millis(5),
        }
    }

    fn written(points: usize) -> StreamOutcome {
        StreamOutcome::Written {
            points,
            duplicates: 0,
            dry_run: false,
        }
    }

    #[test]
    fn test_successful_cycle_exits_zero() {
        let mut cycle = CycleReport::new();
        cycle.push(report("a", written(48)));
        cycle.push(report("b", StreamOutcome::NoData));
        cycle.push(report("c", StreamOutcome::Skipped { reason: "empty".into() }));

        assert!(cycle.is_successful());
        assert_eq!(cycle.points_written(), 48);
        assert_eq!(cycle.exit_code(), EXIT_OK);
    }

    #[test]
    fn test_auth_failure_wins_over_other_failures() {
        let mut cycle = CycleReport::new();
        cycle.push(report(
            "a",
            StreamOutcome::Failed {
                kind: ErrorKind::Transient,
                message: "503".into(),
            },
        ));
        cycle.push(report(
            "b",
            StreamOutcome::from_error(&ProviderError::AuthenticationFailed("401".into()).into()),
        ));

        assert_eq!(cycle.exit_code(), EXIT_AUTH);
    }

    #[test]
    fn test_other_failure_exits_one() {
        let mut cycle = CycleReport::new();
        cycle.push(report("a", written(1)));
        cycle.push(report(
            "b",
            StreamOutcome::Failed {
                kind: ErrorKind::Schema,
                message: "400".into(),
            },
        ));

        assert!(!cycle.is_successful());
        assert_eq!(cycle.exit_code(), EXIT_CYCLE_FAILED);
    }

    #[test]
    fn test_interruption_exit_code() {
        let mut cycle = CycleReport::new();
        cycle.push(report(
            "a",
            StreamOutcome::from_error(&OctographError::Cancelled("fetch".into())),
        ));

        assert!(cycle.interrupted);
        assert_eq!(cycle.exit_code(), EXIT_INTERRUPTED);
    }

    #[test]
    fn test_dry_run_points_are_not_counted_as_written() {
        let outcome = StreamOutcome::Written {
            points: 10,
            duplicates: 0,
            dry_run: true,
        };
        assert_eq!(outcome.label(), "dry_run");
        assert_eq!(outcome.points_written(), 0);
    }
}
