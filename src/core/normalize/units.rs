//! Unit conversion to each kind's canonical unit

use crate::domain::{GasConversion, MeterKind, OctographError, Result, Unit};
use std::str::FromStr;

/// Resolve a reported unit label for a stream kind
///
/// # Errors
///
/// Returns [`OctographError::UnitMismatch`] if the label is unknown or not
/// accepted for `kind` (e.g. `m3` on an electricity stream).
pub fn parse_unit(kind: MeterKind, label: &str) -> Result<Unit> {
    Unit::from_str(label)
        .ok()
        .filter(|unit| kind.accepts(*unit))
        .ok_or_else(|| OctographError::UnitMismatch {
            kind: kind.as_str().to_string(),
            unit: label.to_string(),
        })
}

/// Multiplier taking `unit` to the canonical unit of its dimension
pub fn factor(unit: Unit, gas: &GasConversion) -> f64 {
    match unit {
        Unit::KilowattHours | Unit::Pence => 1.0,
        Unit::WattHours => 1.0 / 1000.0,
        Unit::MegawattHours => 1000.0,
        Unit::CubicMetres => gas.kwh_per_cubic_metre(),
        Unit::Pounds => 100.0,
    }
}

/// Convert a reported value to the canonical unit of `kind`
///
/// # Errors
///
/// Returns [`OctographError::UnitMismatch`] as for [`parse_unit`].
pub fn to_canonical(kind: MeterKind, value: f64, label: &str, gas: &GasConversion) -> Result<f64> {
    let unit = parse_unit(kind, label)?;
    Ok(match unit {
        // Exact: 1000 Wh == 1.0 kWh
        Unit::WattHours => value / 1000.0,
        other => value * factor(other, gas),
    })
}
