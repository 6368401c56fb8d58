//! Meter stream model
//!
//! A [`MeterStream`] names one (account, meter, reading kind) combination tracked
//! for ingestion. Streams are built from configuration at startup and never change
//! afterwards; per-cycle data such as a fetched standing charge is applied to a
//! copy via [`MeterStream::with_resolved_standing_charge`].

use super::ids::{AccountId, MeterPointId, SerialNumber, StreamId};
use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of reading a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterKind {
    /// Half-hourly electricity import
    ElectricityConsumption,
    /// Half-hourly gas consumption
    GasConsumption,
    /// Electricity unit rates from a tariff (e.g. Agile)
    ElectricityCost,
}

impl MeterKind {
    /// Measurement name written to the database
    pub fn measurement(self) -> &'static str {
        match self {
            MeterKind::ElectricityConsumption => "electricity",
            MeterKind::GasConsumption => "gas",
            MeterKind::ElectricityCost => "electricity_cost",
        }
    }

    /// Canonical unit points of this kind are expressed in
    pub fn canonical_unit(self) -> Unit {
        match self {
            MeterKind::ElectricityConsumption | MeterKind::GasConsumption => Unit::KilowattHours,
            MeterKind::ElectricityCost => Unit::Pence,
        }
    }

    /// Units a provider may report for this kind
    pub fn accepted_units(self) -> &'static [Unit] {
        match self {
            MeterKind::ElectricityConsumption => &[
                Unit::KilowattHours,
                Unit::WattHours,
                Unit::MegawattHours,
            ],
            MeterKind::GasConsumption => &[Unit::KilowattHours, Unit::CubicMetres],
            MeterKind::ElectricityCost => &[Unit::Pence, Unit::Pounds],
        }
    }

    /// Whether `unit` is recognized for this kind
    pub fn accepts(self, unit: Unit) -> bool {
        self.accepted_units().contains(&unit)
    }

    /// Config/log label
    pub fn as_str(self) -> &'static str {
        match self {
            MeterKind::ElectricityConsumption => "electricity_consumption",
            MeterKind::GasConsumption => "gas_consumption",
            MeterKind::ElectricityCost => "electricity_cost",
        }
    }
}

impl fmt::Display for MeterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Units understood by the normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    KilowattHours,
    WattHours,
    MegawattHours,
    CubicMetres,
    /// Minor currency unit (GBP pence)
    Pence,
    /// Major currency unit (GBP)
    Pounds,
}

impl Unit {
    /// Canonical label
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::KilowattHours => "kWh",
            Unit::WattHours => "Wh",
            Unit::MegawattHours => "MWh",
            Unit::CubicMetres => "m3",
            Unit::Pence => "p",
            Unit::Pounds => "GBP",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kwh" => Ok(Unit::KilowattHours),
            "wh" => Ok(Unit::WattHours),
            "mwh" => Ok(Unit::MegawattHours),
            "m3" | "m³" | "cubic_metres" => Ok(Unit::CubicMetres),
            "p" | "pence" => Ok(Unit::Pence),
            "gbp" | "£" => Ok(Unit::Pounds),
            other => Err(format!("Unknown unit '{other}'")),
        }
    }
}

/// Factors used to turn a gas volume into energy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasConversion {
    /// Volume correction factor (temperature/pressure)
    pub volume_correction_factor: f64,
    /// Calorific value in MJ/m³
    pub calorific_value: f64,
}

impl GasConversion {
    /// kWh per cubic metre
    pub fn kwh_per_cubic_metre(&self) -> f64 {
        self.volume_correction_factor * self.calorific_value / 3.6
    }
}

impl Default for GasConversion {
    fn default() -> Self {
        Self {
            volume_correction_factor: 1.02264,
            calorific_value: 39.5,
        }
    }
}

/// Off-peak window of a two-rate tariff, evaluated in local time
#[derive(Debug, Clone, PartialEq)]
pub struct LowRateWindow {
    /// Off-peak unit rate in pence/kWh
    pub unit_rate: f64,
    /// Local start of the off-peak period (inclusive)
    pub start: NaiveTime,
    /// Local end of the off-peak period (exclusive); may be before `start`
    pub end: NaiveTime,
    /// Time zone the window is defined in
    pub time_zone: Tz,
}

/// Where a stream's daily standing charge comes from
#[derive(Debug, Clone, PartialEq)]
pub enum StandingCharge {
    /// No standing charge
    None,
    /// Fixed charge in pence/day
    Fixed(f64),
    /// Provider URL whose first result's `value_inc_vat` is the charge
    Url(String),
}

/// Tariff used to attach cost fields to consumption points
#[derive(Debug, Clone, PartialEq)]
pub struct Tariff {
    /// Peak (or only) unit rate in pence/kWh
    pub unit_rate_high: f64,
    /// Optional off-peak window
    pub low_rate: Option<LowRateWindow>,
    /// Daily standing charge
    pub standing_charge: StandingCharge,
}

/// Provider product/tariff codes for [`MeterKind::ElectricityCost`] streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TariffCodes {
    pub product_code: String,
    pub tariff_code: String,
}

/// One ingested stream
#[derive(Debug, Clone, PartialEq)]
pub struct MeterStream {
    pub id: StreamId,
    pub kind: MeterKind,
    pub account_id: AccountId,
    pub meter_point: MeterPointId,
    pub serial_number: SerialNumber,
    /// Unit the provider reports for this meter
    pub reported_unit: Unit,
    /// Nominal length of one reading interval
    pub interval: Duration,
    pub gas_conversion: GasConversion,
    pub tariff: Option<Tariff>,
    pub tariff_codes: Option<TariffCodes>,
}

impl MeterStream {
    /// Create a stream with the default id (`<kind>-<meter_point>`), the kind's
    /// canonical unit and 30-minute intervals
    pub fn new(
        kind: MeterKind,
        account_id: AccountId,
        meter_point: MeterPointId,
        serial_number: SerialNumber,
    ) -> Self {
        let id = StreamId::derived(kind.measurement(), &meter_point);
        Self {
            id,
            kind,
            account_id,
            meter_point,
            serial_number,
            reported_unit: kind.canonical_unit(),
            interval: Duration::minutes(30),
            gas_conversion: GasConversion::default(),
            tariff: None,
            tariff_codes: None,
        }
    }

    /// Override the stream id
    pub fn with_id(mut self, id: StreamId) -> Self {
        self.id = id;
        self
    }

    /// Set the unit the provider reports
    pub fn with_reported_unit(mut self, unit: Unit) -> Self {
        self.reported_unit = unit;
        self
    }

    /// Set the nominal interval length
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set gas conversion factors
    pub fn with_gas_conversion(mut self, conversion: GasConversion) -> Self {
        self.gas_conversion = conversion;
        self
    }

    /// Attach a tariff for cost fields
    pub fn with_tariff(mut self, tariff: Tariff) -> Self {
        self.tariff = Some(tariff);
        self
    }

    /// Set the product/tariff codes of a cost stream
    pub fn with_tariff_codes(mut self, codes: TariffCodes) -> Self {
        self.tariff_codes = Some(codes);
        self
    }

    /// Standing charge URL still to be resolved, if any
    pub fn standing_charge_url(&self) -> Option<&str> {
        match self.tariff.as_ref().map(|t| &t.standing_charge) {
            Some(StandingCharge::Url(url)) => Some(url.as_str()),
            _ => None,
        }
    }

    /// Copy of this stream with a URL standing charge replaced by a fixed value
    pub fn with_resolved_standing_charge(&self, pence_per_day: f64) -> Self {
        let mut resolved = self.clone();
        if let Some(tariff) = resolved.tariff.as_mut() {
            tariff.standing_charge = StandingCharge::Fixed(pence_per_day);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (AccountId, MeterPointId, SerialNumber) {
        (
            AccountId::new("A-1234ABCD").unwrap(),
            MeterPointId::new("1200012345678").unwrap(),
            SerialNumber::new("21L1234567").unwrap(),
        )
    }

    #[test]
    fn test_default_stream_id_and_unit() {
        let (account, mpan, serial) = ids();
        let stream = MeterStream::new(MeterKind::ElectricityConsumption, account, mpan, serial);

        assert_eq!(stream.id.as_str(), "electricity-1200012345678");
        assert_eq!(stream.reported_unit, Unit::KilowattHours);
        assert_eq!(stream.interval, Duration::minutes(30));
    }

    #[test]
    fn test_unit_parsing_is_case_insensitive() {
        assert_eq!(Unit::from_str("KWH").unwrap(), Unit::KilowattHours);
        assert_eq!(Unit::from_str(" wh ").unwrap(), Unit::WattHours);
        assert_eq!(Unit::from_str("m³").unwrap(), Unit::CubicMetres);
        assert!(Unit::from_str("therms").is_err());
    }

    #[test]
    fn test_accepted_units_per_kind() {
        assert!(MeterKind::ElectricityConsumption.accepts(Unit::WattHours));
        assert!(!MeterKind::ElectricityConsumption.accepts(Unit::CubicMetres));
        assert!(MeterKind::GasConsumption.accepts(Unit::CubicMetres));
        assert!(!MeterKind::ElectricityCost.accepts(Unit::KilowattHours));
    }

    #[test]
    fn test_gas_conversion_default() {
        let factor = GasConversion::default().kwh_per_cubic_metre();
        assert!((factor - 11.2208).abs() < 1e-3);
    }

    #[test]
    fn test_resolve_standing_charge() {
        let (account, mpan, serial) = ids();
        let stream = MeterStream::new(MeterKind::ElectricityConsumption, account, mpan, serial)
            .with_tariff(Tariff {
                unit_rate_high: 24.5,
                low_rate: None,
                standing_charge: StandingCharge::Url("https://example.test/sc".to_string()),
            });

        assert_eq!(stream.standing_charge_url(), Some("https://example.test/sc"));

        let resolved = stream.with_resolved_standing_charge(46.36);
        assert_eq!(resolved.standing_charge_url(), None);
        assert_eq!(
            resolved.tariff.unwrap().standing_charge,
            StandingCharge::Fixed(46.36)
        );
        // Original is untouched
        assert!(stream.standing_charge_url().is_some());
    }
}
