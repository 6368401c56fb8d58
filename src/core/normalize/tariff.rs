//! Per-interval cost fields for consumption points
//!
//! A tariff has a peak rate, an optional off-peak window defined in local
//! time, and a daily standing charge spread evenly over the day's intervals.

use crate::domain::{LowRateWindow, OctographError, Result, StandingCharge, Tariff};
use chrono::{DateTime, Duration, NaiveTime, Utc};

/// Which unit rate applied to an interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateBand {
    High,
    Low,
}

impl RateBand {
    pub fn as_str(self) -> &'static str {
        match self {
            RateBand::High => "high",
            RateBand::Low => "low",
        }
    }
}

/// Cost of one interval, all amounts in pence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostFields {
    pub unit_rate: f64,
    pub cost: f64,
    pub standing_charge: f64,
    pub total_cost: f64,
    pub rate_band: RateBand,
}

/// Whether a local time of day falls in `[start, end)`, wrapping midnight
/// when `end <= start`
fn in_window(time: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start < end {
        time >= start && time < end
    } else if start > end {
        time >= start || time < end
    } else {
        false
    }
}

/// Whether an interval starting at `at` falls in the off-peak window
pub fn is_low_rate(window: &LowRateWindow, at: DateTime<Utc>) -> bool {
    let local = at.with_timezone(&window.time_zone).time();
    in_window(local, window.start, window.end)
}

/// Rate band and unit rate for an interval starting at `at`
pub fn rate_for(tariff: &Tariff, at: DateTime<Utc>) -> (RateBand, f64) {
    match &tariff.low_rate {
        Some(window) if is_low_rate(window, at) => (RateBand::Low, window.unit_rate),
        _ => (RateBand::High, tariff.unit_rate_high),
    }
}

/// Standing charge attributable to one interval
///
/// # Errors
///
/// Returns [`OctographError::InvalidReading`] if the charge is still a URL;
/// the scheduler resolves URLs before normalizing.
pub fn standing_charge_for(tariff: &Tariff, interval: Duration) -> Result<f64> {
    match &tariff.standing_charge {
        StandingCharge::None => Ok(0.0),
        StandingCharge::Fixed(per_day) => {
            Ok(per_day * interval.num_seconds() as f64 / Duration::days(1).num_seconds() as f64)
        }
        StandingCharge::Url(url) => Err(OctographError::InvalidReading(format!(
            "Standing charge from {url} was not resolved"
        ))),
    }
}

/// Cost fields for `kwh` consumed in the interval starting at `at`
pub fn cost_fields(
    tariff: &Tariff,
    kwh: f64,
    at: DateTime<Utc>,
    interval: Duration,
) -> Result<CostFields> {
    let (rate_band, unit_rate) = rate_for(tariff, at);
    let cost = kwh * unit_rate;
    let standing_charge = standing_charge_for(tariff, interval)?;

    Ok(CostFields {
        unit_rate,
        cost,
        standing_charge,
        total_cost: cost + standing_charge,
        rate_band,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::London;

    fn economy7() -> Tariff {
        Tariff {
            unit_rate_high: 30.0,
            low_rate: Some(LowRateWindow {
                unit_rate: 10.0,
                start: NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
                end: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
                time_zone: London,
            }),
            standing_charge: StandingCharge::Fixed(48.0),
        }
    }

    #[test]
    fn test_window_wraps_midnight() {
        let start = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let end = NaiveTime::from_hms_opt(6, 30, 0).unwrap();

        assert!(in_window(NaiveTime::from_hms_opt(23, 30, 0).unwrap(), start, end));
        assert!(in_window(NaiveTime::from_hms_opt(2, 0, 0).unwrap(), start, end));
        assert!(!in_window(NaiveTime::from_hms_opt(6, 30, 0).unwrap(), start, end));
        assert!(!in_window(NaiveTime::from_hms_opt(12, 0, 0).unwrap(), start, end));
    }

    #[test]
    fn test_empty_window_never_matches() {
        let t = NaiveTime::from_hms_opt(1, 0, 0).unwrap();
        assert!(!in_window(t, t, t));
    }

    #[test]
    fn test_rate_band_uses_local_time() {
        let tariff = economy7();

        // 22:30 UTC in July is 23:30 BST: off-peak
        let summer = Utc.with_ymd_and_hms(2024, 7, 1, 22, 30, 0).unwrap();
        assert_eq!(rate_for(&tariff, summer), (RateBand::Low, 10.0));

        // 22:30 UTC in January is 22:30 GMT: peak
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 22, 30, 0).unwrap();
        assert_eq!(rate_for(&tariff, winter), (RateBand::High, 30.0));
    }

    #[test]
    fn test_cost_fields_for_half_hour() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let fields = cost_fields(&economy7(), 0.5, at, Duration::minutes(30)).unwrap();

        assert_eq!(fields.rate_band, RateBand::High);
        assert_eq!(fields.unit_rate, 30.0);
        assert_eq!(fields.cost, 15.0);
        assert_eq!(fields.standing_charge, 1.0);
        assert_eq!(fields.total_cost, 16.0);
    }

    #[test]
    fn test_single_rate_without_standing_charge() {
        let tariff = Tariff {
            unit_rate_high: 24.5,
            low_rate: None,
            standing_charge: StandingCharge::None,
        };
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap();
        let fields = cost_fields(&tariff, 2.0, at, Duration::minutes(30)).unwrap();

        assert_eq!(fields.rate_band, RateBand::High);
        assert_eq!(fields.cost, 49.0);
        assert_eq!(fields.total_cost, 49.0);
    }

    #[test]
    fn test_unresolved_standing_charge_is_rejected() {
        let tariff = Tariff {
            unit_rate_high: 24.5,
            low_rate: None,
            standing_charge: StandingCharge::Url("https://example.test/sc".to_string()),
        };
        assert!(standing_charge_for(&tariff, Duration::minutes(30)).is_err());
    }
}
