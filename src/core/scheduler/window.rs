//! Query window computation
//!
//! A window is `[start, end)` where `end = now - publication_lag`, aligned
//! down to the stream interval. `start` is an operator override if one is
//! pending, else the stored watermark, else `end - initial_lookback`.

use crate::config::ScheduleConfig;
use crate::domain::RawInterval;
use chrono::{DateTime, Duration, DurationRound, Utc};

/// Half-open time range fetched for one stream in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether a reading belongs to this window (by its start)
    pub fn contains(&self, reading: &RawInterval) -> bool {
        reading.starts_within(self.start, self.end)
    }

    pub fn as_pair(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start, self.end)
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// What to do with a stream this tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDecision {
    Fetch(Window),
    Skip(String),
}

/// Window rules from `[schedule]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPlan {
    pub publication_lag: Duration,
    pub initial_lookback: Duration,
    /// `None` means unbounded
    pub max_window: Option<Duration>,
    pub min_window: Duration,
}

impl WindowPlan {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            publication_lag: Duration::minutes(config.publication_lag_minutes as i64),
            initial_lookback: Duration::hours(config.initial_lookback_hours as i64),
            max_window: (config.max_window_hours > 0)
                .then(|| Duration::hours(config.max_window_hours as i64)),
            min_window: Duration::minutes(config.min_window_minutes as i64),
        }
    }

    /// Decide the window for one stream
    ///
    /// `interval` is the stream's nominal reading length; the window end is
    /// aligned down to it so a partly published interval is left for the
    /// next tick.
    pub fn decide(
        &self,
        now: DateTime<Utc>,
        watermark: Option<DateTime<Utc>>,
        start_override: Option<DateTime<Utc>>,
        interval: Duration,
    ) -> WindowDecision {
        let latest = now - self.publication_lag;
        let mut end = latest.duration_trunc(interval).unwrap_or(latest);

        let start = start_override
            .or(watermark)
            .unwrap_or_else(|| end - self.initial_lookback);

        if let Some(max) = self.max_window {
            if end - start > max {
                end = start + max;
            }
        }

        if end <= start {
            return WindowDecision::Skip(format!(
                "window empty: start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            ));
        }

        let window = Window::new(start, end);
        if window.duration() < self.min_window {
            return WindowDecision::Skip(format!(
                "window {window} shorter than {} minutes",
                self.min_window.num_minutes()
            ));
        }

        WindowDecision::Fetch(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan() -> WindowPlan {
        WindowPlan::from_config(&ScheduleConfig::default())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn half_hour() -> Duration {
        Duration::minutes(30)
    }

    fn fetch(decision: WindowDecision) -> Window {
        match decision {
            WindowDecision::Fetch(w) => w,
            WindowDecision::Skip(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn test_first_run_uses_lookback() {
        let now = t0() + Duration::hours(1) + Duration::minutes(10);
        let window = fetch(plan().decide(now, None, None, half_hour()));

        assert_eq!(window.end, t0());
        assert_eq!(window.start, t0() - Duration::hours(168));
    }

    #[test]
    fn test_watermark_is_the_start() {
        let now = t0() + Duration::hours(25) + Duration::minutes(10);
        let window = fetch(plan().decide(now, Some(t0()), None, half_hour()));

        assert_eq!(window, Window::new(t0(), t0() + Duration::hours(24)));
    }

    #[test]
    fn test_override_beats_watermark() {
        let now = t0() + Duration::hours(25);
        let backfill = t0() - Duration::days(30);
        let window = fetch(plan().decide(now, Some(t0()), Some(backfill), half_hour()));

        assert_eq!(window.start, backfill);
    }

    #[test]
    fn test_max_window_caps_end() {
        let mut plan = plan();
        plan.max_window = Some(Duration::hours(24));
        let now = t0() + Duration::days(10);
        let window = fetch(plan.decide(now, Some(t0()), None, half_hour()));

        assert_eq!(window.end, t0() + Duration::hours(24));
    }

    #[test]
    fn test_short_and_empty_windows_are_skipped() {
        // Watermark already at the aligned end
        let now = t0() + Duration::hours(1) + Duration::minutes(20);
        assert!(matches!(
            plan().decide(now, Some(t0()), None, half_hour()),
            WindowDecision::Skip(_)
        ));

        let mut plan = plan();
        plan.min_window = Duration::hours(2);
        let now = t0() + Duration::hours(2);
        assert!(matches!(
            plan.decide(now, Some(t0()), None, half_hour()),
            WindowDecision::Skip(_)
        ));
    }

    #[test]
    fn test_consecutive_windows_are_monotonic() {
        let plan = plan();
        let first = fetch(plan.decide(t0() + Duration::hours(26), Some(t0()), None, half_hour()));
        let second = fetch(plan.decide(
            t0() + Duration::hours(30),
            Some(first.end),
            None,
            half_hour(),
        ));

        assert!(second.start >= first.end);
    }

    #[test]
    fn test_contains_is_half_open() {
        let window = Window::new(t0(), t0() + Duration::hours(1));
        let inside = RawInterval::new(t0(), t0() + half_hour(), 0.1, "kWh");
        let at_end = RawInterval::new(window.end, window.end + half_hour(), 0.1, "kWh");

        assert!(window.contains(&inside));
        assert!(!window.contains(&at_end));
    }
}
