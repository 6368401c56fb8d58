//! Configuration schema types
//!
//! This module defines the configuration structure for Octograph. Each section
//! validates itself; [`OctographConfig::validate`] runs them all and checks the
//! cross-section rules.

use crate::config::SecretString;
use crate::domain::{
    AccountId, GasConversion, LowRateWindow, MeterKind, MeterPointId, MeterStream, SerialNumber,
    StandingCharge, StreamId, Tariff, TariffCodes, Unit,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

/// Main Octograph configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct OctographConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Provider API configuration
    pub octopus: OctopusConfig,

    /// Streams to ingest
    #[serde(default)]
    pub streams: Vec<StreamConfig>,

    /// InfluxDB configuration
    pub influxdb: InfluxDbConfig,

    /// Polling schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Watermark persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl OctographConfig {
    /// Load, override and validate a configuration file
    ///
    /// Shorthand for [`crate::config::load_config`].
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        super::loader::load_config(path)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.octopus.validate()?;
        self.influxdb.validate()?;
        self.schedule.validate()?;
        self.state.validate()?;
        self.logging.validate()?;

        if self.streams.is_empty() {
            return Err("At least one [[streams]] entry is required".to_string());
        }

        // Building the streams runs every per-stream check
        let streams = self.meter_streams()?;

        let mut seen = HashSet::new();
        for stream in &streams {
            if !seen.insert(stream.id.clone()) {
                return Err(format!("Duplicate stream id '{}'", stream.id));
            }
        }

        for id in &self.schedule.streams {
            if !seen.iter().any(|s| s.as_str() == id) {
                return Err(format!("schedule.streams names unknown stream '{id}'"));
            }
        }

        Ok(())
    }

    /// Build the immutable stream definitions
    pub fn meter_streams(&self) -> Result<Vec<MeterStream>, String> {
        self.streams
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                s.to_meter_stream(self.octopus.account.as_deref())
                    .map_err(|e| format!("streams[{idx}]: {e}"))
            })
            .collect()
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (fetch and normalize, don't write or advance watermarks)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Randomize each delay between half and the full computed value
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl RetryConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err(format!(
                "{section}.retry.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }
        if self.initial_delay_ms == 0 {
            return Err(format!("{section}.retry.initial_delay_ms must be > 0"));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(format!(
                "{section}.retry.max_delay_ms must be >= initial_delay_ms"
            ));
        }
        if self.backoff_multiplier.is_nan() || self.backoff_multiplier < 1.0 {
            return Err(format!(
                "{section}.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Provider API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OctopusConfig {
    /// API origin, e.g. `https://api.octopus.energy`
    #[serde(default = "default_octopus_base_url")]
    pub base_url: String,

    /// API key, sent as the basic-auth username
    /// Stored securely in memory and automatically zeroized on drop
    pub api_key: SecretString,

    /// Default account for streams that don't name one
    #[serde(default)]
    pub account: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Results requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Hard cap on pages followed per fetch
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Minimum spacing between consecutive requests in milliseconds (0 disables)
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl OctopusConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        validate_http_url("octopus.base_url", &self.base_url)?;

        if self.api_key.expose_secret().is_empty() {
            return Err("octopus.api_key cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("octopus.timeout_seconds must be > 0".to_string());
        }

        if !(1..=25000).contains(&self.page_size) {
            return Err(format!(
                "octopus.page_size must be between 1 and 25000, got {}",
                self.page_size
            ));
        }

        if self.max_pages == 0 {
            return Err("octopus.max_pages must be > 0".to_string());
        }

        self.retry.validate("octopus")
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Minimum request spacing
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

/// Tariff attached to a consumption stream
#[derive(Debug, Clone, Deserialize)]
pub struct TariffConfig {
    /// Peak (or only) unit rate in pence/kWh
    pub unit_rate_high: f64,

    /// Off-peak unit rate in pence/kWh
    #[serde(default)]
    pub unit_rate_low: Option<f64>,

    /// Local off-peak start, `HH:MM`
    #[serde(default)]
    pub low_start: Option<String>,

    /// Local off-peak end, `HH:MM`
    #[serde(default)]
    pub low_end: Option<String>,

    /// IANA time zone of the off-peak window
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Fixed standing charge in pence/day
    #[serde(default)]
    pub standing_charge: Option<f64>,

    /// Provider URL to resolve the standing charge from
    #[serde(default)]
    pub standing_charge_url: Option<String>,
}

impl TariffConfig {
    fn to_tariff(&self) -> Result<Tariff, String> {
        if !self.unit_rate_high.is_finite() || self.unit_rate_high < 0.0 {
            return Err("tariff.unit_rate_high must be a non-negative number".to_string());
        }

        let low_rate = match (self.unit_rate_low, &self.low_start, &self.low_end) {
            (None, None, None) => None,
            (Some(rate), Some(start), Some(end)) => {
                if !rate.is_finite() || rate < 0.0 {
                    return Err("tariff.unit_rate_low must be a non-negative number".to_string());
                }
                let start = parse_hh_mm("tariff.low_start", start)?;
                let end = parse_hh_mm("tariff.low_end", end)?;
                if start == end {
                    return Err("tariff.low_start and tariff.low_end must differ".to_string());
                }
                let time_zone = Tz::from_str(&self.time_zone)
                    .map_err(|_| format!("Unknown tariff.time_zone '{}'", self.time_zone))?;
                Some(LowRateWindow {
                    unit_rate: rate,
                    start,
                    end,
                    time_zone,
                })
            }
            _ => {
                return Err(
                    "tariff.unit_rate_low, low_start and low_end must be set together".to_string(),
                )
            }
        };

        let standing_charge = match (self.standing_charge, &self.standing_charge_url) {
            (None, None) => StandingCharge::None,
            (Some(charge), None) => {
                if !charge.is_finite() || charge < 0.0 {
                    return Err("tariff.standing_charge must be a non-negative number".to_string());
                }
                StandingCharge::Fixed(charge)
            }
            (None, Some(url)) => {
                validate_http_url("tariff.standing_charge_url", url)?;
                StandingCharge::Url(url.clone())
            }
            (Some(_), Some(_)) => {
                return Err(
                    "tariff.standing_charge and tariff.standing_charge_url are mutually exclusive"
                        .to_string(),
                )
            }
        };

        Ok(Tariff {
            unit_rate_high: self.unit_rate_high,
            low_rate,
            standing_charge,
        })
    }
}

/// One `[[streams]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Stream id; defaults to `<measurement>-<meter_point>`
    #[serde(default)]
    pub id: Option<String>,

    /// Kind of reading
    pub kind: MeterKind,

    /// Account; defaults to `octopus.account`
    #[serde(default)]
    pub account: Option<String>,

    /// MPAN or MPRN
    pub meter_point: String,

    /// Meter serial number
    pub serial_number: String,

    /// Unit the provider reports; defaults to the kind's canonical unit
    #[serde(default)]
    pub unit: Option<String>,

    /// Nominal interval length in minutes
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Gas volume correction factor
    #[serde(default)]
    pub volume_correction_factor: Option<f64>,

    /// Gas calorific value in MJ/m³
    #[serde(default)]
    pub calorific_value: Option<f64>,

    /// Product code (cost streams)
    #[serde(default)]
    pub product_code: Option<String>,

    /// Tariff code (cost streams)
    #[serde(default)]
    pub tariff_code: Option<String>,

    /// Tariff for cost fields on consumption points
    #[serde(default)]
    pub tariff: Option<TariffConfig>,
}

impl StreamConfig {
    /// Convert into a domain stream, validating every field
    pub fn to_meter_stream(&self, default_account: Option<&str>) -> Result<MeterStream, String> {
        let account = self
            .account
            .as_deref()
            .or(default_account)
            .ok_or_else(|| "account is required (set it here or in octopus.account)".to_string())?;
        let account_id = AccountId::new(account)?;
        let meter_point = MeterPointId::new(self.meter_point.as_str())?;
        let serial_number = SerialNumber::new(self.serial_number.as_str())?;

        if self.interval_minutes == 0 {
            return Err("interval_minutes must be > 0".to_string());
        }

        let mut stream = MeterStream::new(self.kind, account_id, meter_point, serial_number)
            .with_interval(chrono::Duration::minutes(i64::from(self.interval_minutes)));

        if let Some(id) = &self.id {
            stream = stream.with_id(StreamId::new(id.as_str())?);
        }

        if let Some(unit) = &self.unit {
            let unit = Unit::from_str(unit)?;
            if !self.kind.accepts(unit) {
                return Err(format!("unit '{unit}' is not valid for kind {}", self.kind));
            }
            stream = stream.with_reported_unit(unit);
        }

        if self.volume_correction_factor.is_some() || self.calorific_value.is_some() {
            if self.kind != MeterKind::GasConsumption {
                return Err("gas conversion factors only apply to gas_consumption".to_string());
            }
            let defaults = GasConversion::default();
            let conversion = GasConversion {
                volume_correction_factor: self
                    .volume_correction_factor
                    .unwrap_or(defaults.volume_correction_factor),
                calorific_value: self.calorific_value.unwrap_or(defaults.calorific_value),
            };
            if conversion.volume_correction_factor <= 0.0
                || conversion.calorific_value <= 0.0
                || !conversion.kwh_per_cubic_metre().is_finite()
            {
                return Err("gas conversion factors must be positive".to_string());
            }
            stream = stream.with_gas_conversion(conversion);
        }

        match (self.kind, &self.product_code, &self.tariff_code) {
            (MeterKind::ElectricityCost, Some(product), Some(tariff))
                if !product.trim().is_empty() && !tariff.trim().is_empty() =>
            {
                stream = stream.with_tariff_codes(TariffCodes {
                    product_code: product.trim().to_string(),
                    tariff_code: tariff.trim().to_string(),
                });
            }
            (MeterKind::ElectricityCost, _, _) => {
                return Err("electricity_cost streams need product_code and tariff_code".to_string())
            }
            (_, None, None) => {}
            _ => {
                return Err(
                    "product_code/tariff_code only apply to electricity_cost streams".to_string(),
                )
            }
        }

        if let Some(tariff) = &self.tariff {
            if self.kind == MeterKind::ElectricityCost {
                return Err("electricity_cost streams cannot carry a tariff".to_string());
            }
            stream = stream.with_tariff(tariff.to_tariff()?);
        }

        Ok(stream)
    }
}

/// InfluxDB configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxDbConfig {
    /// Major version of the write API (1 or 2)
    #[serde(default = "default_influx_version")]
    pub version: u8,

    /// Server URL, e.g. `http://localhost:8086`
    pub url: String,

    /// API token (2.x)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Organization (2.x)
    #[serde(default)]
    pub org: Option<String>,

    /// Bucket (2.x)
    #[serde(default)]
    pub bucket: Option<String>,

    /// Database (1.x)
    #[serde(default)]
    pub database: Option<String>,

    /// Username (1.x, optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Password (1.x, optional)
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl InfluxDbConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        validate_http_url("influxdb.url", &self.url)?;

        match self.version {
            2 => {
                let token_missing = self
                    .token
                    .as_ref()
                    .map(|t| t.expose_secret().is_empty())
                    .unwrap_or(true);
                if token_missing {
                    return Err("influxdb.token is required for version 2".to_string());
                }
                if self.org.as_deref().map(str::is_empty).unwrap_or(true) {
                    return Err("influxdb.org is required for version 2".to_string());
                }
                if self.bucket.as_deref().map(str::is_empty).unwrap_or(true) {
                    return Err("influxdb.bucket is required for version 2".to_string());
                }
            }
            1 => {
                if self.database.as_deref().map(str::is_empty).unwrap_or(true) {
                    return Err("influxdb.database is required for version 1".to_string());
                }
                if self.password.is_some() && self.username.is_none() {
                    return Err("influxdb.password requires influxdb.username".to_string());
                }
            }
            other => {
                return Err(format!("influxdb.version must be 1 or 2, got {other}"));
            }
        }

        if self.timeout_seconds == 0 {
            return Err("influxdb.timeout_seconds must be > 0".to_string());
        }

        self.retry.validate("influxdb")
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// Loop forever
    #[default]
    Daemon,
    /// Exactly one cycle
    Once,
}

impl FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daemon" => Ok(ScheduleMode::Daemon),
            "once" => Ok(ScheduleMode::Once),
            other => Err(format!("Invalid schedule.mode '{other}'. Must be one of: daemon, once")),
        }
    }
}

/// Polling schedule configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Daemon or once
    #[serde(default)]
    pub mode: ScheduleMode,

    /// Time between cycle starts in daemon mode
    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// How far behind now the provider is assumed complete
    #[serde(default = "default_publication_lag_minutes")]
    pub publication_lag_minutes: u64,

    /// Lookback for streams without a watermark
    #[serde(default = "default_initial_lookback_hours")]
    pub initial_lookback_hours: u64,

    /// Upper bound on one window, 0 for unbounded
    #[serde(default)]
    pub max_window_hours: u64,

    /// Windows shorter than this are skipped
    #[serde(default = "default_min_window_minutes")]
    pub min_window_minutes: u64,

    /// Streams processed concurrently
    #[serde(default = "default_max_parallel_streams")]
    pub max_parallel_streams: usize,

    /// Start-date override (RFC 3339 or YYYY-MM-DD)
    #[serde(default)]
    pub start_from: Option<String>,

    /// Restrict the run to these stream ids (empty = all)
    #[serde(default)]
    pub streams: Vec<String>,
}

impl ScheduleConfig {
    fn validate(&self) -> Result<(), String> {
        if self.poll_interval_seconds == 0 {
            return Err("schedule.poll_interval_seconds must be > 0".to_string());
        }
        if self.initial_lookback_hours == 0 {
            return Err("schedule.initial_lookback_hours must be > 0".to_string());
        }
        if self.max_parallel_streams == 0 || self.max_parallel_streams > 32 {
            return Err(format!(
                "schedule.max_parallel_streams must be between 1 and 32, got {}",
                self.max_parallel_streams
            ));
        }
        if self.max_window_hours > 0
            && self.max_window_hours * 60 < self.min_window_minutes
        {
            return Err("schedule.max_window_hours is shorter than min_window_minutes".to_string());
        }
        if let Some(start) = &self.start_from {
            parse_start_from(start)?;
        }
        Ok(())
    }

    /// Parsed start-date override
    pub fn start_override(&self) -> Result<Option<DateTime<Utc>>, String> {
        self.start_from.as_deref().map(parse_start_from).transpose()
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            mode: ScheduleMode::Daemon,
            poll_interval_seconds: default_poll_interval_seconds(),
            publication_lag_minutes: default_publication_lag_minutes(),
            initial_lookback_hours: default_initial_lookback_hours(),
            max_window_hours: 0,
            min_window_minutes: default_min_window_minutes(),
            max_parallel_streams: default_max_parallel_streams(),
            start_from: None,
            streams: Vec::new(),
        }
    }
}

/// Watermark persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// Process memory only
    #[default]
    Memory,
    /// JSON file
    File,
    /// Derived from the last point in InfluxDB
    InfluxDb,
}

impl FromStr for StateBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StateBackend::Memory),
            "file" => Ok(StateBackend::File),
            "influxdb" => Ok(StateBackend::InfluxDb),
            other => Err(format!(
                "Invalid state.backend '{other}'. Must be one of: memory, file, influxdb"
            )),
        }
    }
}

/// State management configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Backend
    #[serde(default)]
    pub backend: StateBackend,

    /// File path for the `file` backend
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backend == StateBackend::File && self.path.trim().is_empty() {
            return Err("state.path cannot be empty when backend = 'file'".to_string());
        }
        Ok(())
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::Memory,
            path: default_state_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Console output format (text or json)
    #[serde(default = "default_console_format")]
    pub console_format: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.console_format.as_str()) {
            return Err(format!(
                "Invalid logging.console_format '{}'. Must be one of: {}",
                self.console_format,
                valid_formats.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            console_format: default_console_format(),
        }
    }
}

/// Parse a start-date override: RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC)
pub fn parse_start_from(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("Invalid start date '{value}'. Use RFC 3339 or YYYY-MM-DD"))
}

fn parse_hh_mm(field: &str, value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("{field} must be HH:MM, got '{value}'"))
}

fn validate_http_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(format!("{field} must start with http:// or https://"));
    }
    url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_octopus_base_url() -> String {
    "https://api.octopus.energy".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_page_size() -> usize {
    100
}

fn default_max_pages() -> usize {
    500
}

fn default_min_request_interval_ms() -> u64 {
    250
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_interval_minutes() -> u32 {
    30
}

fn default_time_zone() -> String {
    "Europe/London".to_string()
}

fn default_influx_version() -> u8 {
    2
}

fn default_poll_interval_seconds() -> u64 {
    1800
}

fn default_publication_lag_minutes() -> u64 {
    60
}

fn default_initial_lookback_hours() -> u64 {
    // One week
    168
}

fn default_min_window_minutes() -> u64 {
    30
}

fn default_max_parallel_streams() -> usize {
    1
}

fn default_state_path() -> String {
    "octograph-state.json".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_console_format() -> String {
    "text".to_string()
}
