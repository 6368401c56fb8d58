//! Reading normalization
//!
//! Turns provider intervals into [`Point`]s: timestamp at the interval start
//! truncated to whole seconds, value in the kind's canonical unit, tags from
//! the stream identifiers and, for streams with a tariff, cost fields.
//!
//! Normalization is pure. The same stream and interval always produce the
//! same point, which is what makes replaying a window safe.

pub mod tariff;
pub mod units;

use crate::domain::{MeterKind, MeterStream, OctographError, Point, RawInterval, Result};
use chrono::SubsecRound;
use std::collections::BTreeMap;

pub use tariff::{cost_fields, CostFields, RateBand};
pub use units::{parse_unit, to_canonical};

/// Tag set shared by every point of a stream
pub fn stream_tags(stream: &MeterStream) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("account".to_string(), stream.account_id.to_string()),
        ("meter".to_string(), stream.meter_point.to_string()),
        ("serial".to_string(), stream.serial_number.to_string()),
    ])
}

/// Normalize one raw interval
///
/// # Errors
///
/// - [`OctographError::InvalidReading`] for a non-finite value, or a tariff
///   whose standing charge was never resolved
/// - [`OctographError::UnitMismatch`] for a unit the stream kind does not accept
///
/// # Examples
///
/// ```
/// use octograph::core::normalize::normalize;
/// use octograph::domain::{AccountId, MeterKind, MeterPointId, MeterStream, RawInterval, SerialNumber};
/// use chrono::{Duration, TimeZone, Utc};
///
/// let stream = MeterStream::new(
///     MeterKind::ElectricityConsumption,
///     AccountId::new("A-1234ABCD").unwrap(),
///     MeterPointId::new("1200012345678").unwrap(),
///     SerialNumber::new("21L1234567").unwrap(),
/// );
/// let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
/// let raw = RawInterval::new(start, start + Duration::minutes(30), 1000.0, "Wh");
///
/// let point = normalize(&stream, &raw).unwrap();
/// assert_eq!(point.measurement, "electricity");
/// assert_eq!(point.float_field("value"), Some(1.0));
/// ```
pub fn normalize(stream: &MeterStream, raw: &RawInterval) -> Result<Point> {
    if !raw.value.is_finite() {
        return Err(OctographError::InvalidReading(format!(
            "Non-finite value {} at {}",
            raw.value, raw.start
        )));
    }

    let value = to_canonical(stream.kind, raw.value, &raw.unit, &stream.gas_conversion)?;
    let timestamp = raw.start.trunc_subsecs(0);

    let mut point = Point::new(stream.kind.measurement(), timestamp)
        .field("value", value)
        .field("raw_value", raw.value)
        .field("raw_unit", raw.unit.trim());
    point.tags = stream_tags(stream);

    if let (Some(tariff), true) = (&stream.tariff, stream.kind != MeterKind::ElectricityCost) {
        let costs = cost_fields(tariff, value, raw.start, stream.interval)?;
        point = point
            .field("unit_rate", costs.unit_rate)
            .field("cost", costs.cost)
            .field("standing_charge", costs.standing_charge)
            .field("total_cost", costs.total_cost)
            .field("rate_band", costs.rate_band.as_str());
    }

    Ok(point)
}

/// Normalize a batch, stopping at the first failure
pub fn normalize_all(stream: &MeterStream, readings: &[RawInterval]) -> Result<Vec<Point>> {
    readings.iter().map(|raw| normalize(stream, raw)).collect()
}
