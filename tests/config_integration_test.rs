//! Integration tests for configuration loading and validation
//!
//! Every test that calls `load_config` holds `ENV_MUTEX`, since loading reads
//! `OCTOGRAPH_*` overrides from the process environment.

use octograph::config::{load_config, ScheduleMode, StateBackend};
use octograph::domain::{ErrorKind, MeterKind, StandingCharge};
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

// Mutex to serialize tests that read or modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn lock_env() -> MutexGuard<'static, ()> {
    let guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    guard
}

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for var in [
        "OCTOGRAPH_APPLICATION_LOG_LEVEL",
        "OCTOGRAPH_APPLICATION_DRY_RUN",
        "OCTOGRAPH_OCTOPUS_API_KEY",
        "OCTOGRAPH_OCTOPUS_PAGE_SIZE",
        "OCTOGRAPH_INFLUXDB_BUCKET",
        "OCTOGRAPH_SCHEDULE_MODE",
        "OCTOGRAPH_STREAMS",
        "OCTOGRAPH_STATE_BACKEND",
        "TEST_OCTOPUS_API_KEY",
        "TEST_INFLUXDB_TOKEN",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const MINIMAL: &str = r#"
[octopus]
api_key = "sk_test_minimal"
account = "A-1234ABCD"

[[streams]]
kind = "electricity_consumption"
meter_point = "1200012345678"
serial_number = "21L1234567"

[influxdb]
url = "http://localhost:8086"
token = "influx-token"
org = "home"
bucket = "energy"
"#;

#[test]
fn test_load_complete_config() {
    let _guard = lock_env();
    let file = write_config(
        r#"
[application]
log_level = "debug"
dry_run = true

[octopus]
base_url = "https://api.octopus.energy"
api_key = "sk_live_abc"
account = "A-1234ABCD"
timeout_seconds = 10
page_size = 250
max_pages = 50
min_request_interval_ms = 500

[octopus.retry]
max_retries = 5
initial_delay_ms = 200
max_delay_ms = 5000
backoff_multiplier = 3.0
jitter = false

[[streams]]
id = "house"
kind = "electricity_consumption"
meter_point = "1200012345678"
serial_number = "21L1234567"
unit = "Wh"

[streams.tariff]
unit_rate_high = 28.62
unit_rate_low = 7.5
low_start = "00:30"
low_end = "04:30"
standing_charge_url = "https://api.octopus.energy/v1/products/X/electricity-tariffs/Y/standing-charges/"

[[streams]]
kind = "gas_consumption"
meter_point = "1234567890"
serial_number = "E6S12345678901"
unit = "m3"
calorific_value = 39.2

[[streams]]
id = "agile"
kind = "electricity_cost"
meter_point = "1200012345678"
serial_number = "21L1234567"
product_code = "AGILE-24-10-01"
tariff_code = "E-1R-AGILE-24-10-01-C"

[influxdb]
version = 1
url = "http://influx.local:8086"
database = "energy"
username = "octo"
password = "pw"

[schedule]
mode = "once"
poll_interval_seconds = 600
publication_lag_minutes = 90
initial_lookback_hours = 48
max_window_hours = 24
max_parallel_streams = 2
start_from = "2024-01-01"

[state]
backend = "file"
path = "/tmp/octograph-state.json"

[logging]
console_format = "json"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);
    assert_eq!(config.octopus.page_size, 250);
    assert_eq!(config.octopus.retry.max_retries, 5);
    assert!(!config.octopus.retry.jitter);
    assert_eq!(config.influxdb.version, 1);
    assert_eq!(config.schedule.mode, ScheduleMode::Once);
    assert_eq!(config.schedule.max_parallel_streams, 2);
    assert!(config.schedule.start_override().unwrap().is_some());
    assert_eq!(config.state.backend, StateBackend::File);
    assert_eq!(config.logging.console_format, "json");

    let streams = config.meter_streams().unwrap();
    assert_eq!(streams.len(), 3);
    assert_eq!(streams[0].id.as_str(), "house");
    assert!(matches!(
        streams[0].tariff.as_ref().unwrap().standing_charge,
        StandingCharge::Url(_)
    ));
    assert_eq!(streams[1].id.as_str(), "gas-1234567890");
    assert_eq!(streams[1].kind, MeterKind::GasConsumption);
    assert_eq!(streams[1].gas_conversion.calorific_value, 39.2);
    assert_eq!(streams[2].kind, MeterKind::ElectricityCost);
}

#[test]
fn test_load_minimal_config_defaults() {
    let _guard = lock_env();
    let file = write_config(MINIMAL);

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(!config.application.dry_run);
    assert_eq!(config.octopus.base_url, "https://api.octopus.energy");
    assert_eq!(config.influxdb.version, 2);
    assert_eq!(config.schedule.mode, ScheduleMode::Daemon);
    assert_eq!(config.schedule.poll_interval_seconds, 1800);
    assert_eq!(config.state.backend, StateBackend::Memory);
    assert!(!config.logging.local_enabled);

    let streams = config.meter_streams().unwrap();
    assert_eq!(streams[0].id.as_str(), "electricity-1200012345678");
    assert_eq!(streams[0].interval, chrono::Duration::minutes(30));
}

#[test]
fn test_env_var_substitution() {
    let _guard = lock_env();
    std::env::set_var("TEST_OCTOPUS_API_KEY", "sk_from_env");
    std::env::set_var("TEST_INFLUXDB_TOKEN", "token_from_env");

    let file = write_config(
        &MINIMAL
            .replace("sk_test_minimal", "${TEST_OCTOPUS_API_KEY}")
            .replace("influx-token", "${TEST_INFLUXDB_TOKEN}"),
    );
    let config = load_config(file.path()).unwrap();

    use secrecy::ExposeSecret;
    assert_eq!(config.octopus.api_key.expose_secret().as_ref(), "sk_from_env");
    assert_eq!(
        config.influxdb.token.as_ref().unwrap().expose_secret().as_ref(),
        "token_from_env"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_configuration_error() {
    let _guard = lock_env();
    let file = write_config(&MINIMAL.replace("sk_test_minimal", "${TEST_OCTOPUS_API_KEY}"));

    let err = load_config(file.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("TEST_OCTOPUS_API_KEY"));
}

#[test]
fn test_env_overrides() {
    let _guard = lock_env();
    std::env::set_var("OCTOGRAPH_APPLICATION_LOG_LEVEL", "WARN");
    std::env::set_var("OCTOGRAPH_APPLICATION_DRY_RUN", "true");
    std::env::set_var("OCTOGRAPH_OCTOPUS_PAGE_SIZE", "500");
    std::env::set_var("OCTOGRAPH_INFLUXDB_BUCKET", "override");
    std::env::set_var("OCTOGRAPH_SCHEDULE_MODE", "once");
    std::env::set_var("OCTOGRAPH_STATE_BACKEND", "file");

    let file = write_config(MINIMAL);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert!(config.application.dry_run);
    assert_eq!(config.octopus.page_size, 500);
    assert_eq!(config.influxdb.bucket.as_deref(), Some("override"));
    assert_eq!(config.schedule.mode, ScheduleMode::Once);
    assert_eq!(config.state.backend, StateBackend::File);

    cleanup_env_vars();
}

#[test]
fn test_invalid_env_override_value() {
    let _guard = lock_env();
    std::env::set_var("OCTOGRAPH_OCTOPUS_PAGE_SIZE", "lots");

    let file = write_config(MINIMAL);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("OCTOGRAPH_OCTOPUS_PAGE_SIZE"));

    cleanup_env_vars();
}

#[test]
fn test_streams_override_must_name_known_streams() {
    let _guard = lock_env();
    std::env::set_var("OCTOGRAPH_STREAMS", "boiler");

    let file = write_config(MINIMAL);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("boiler"));

    cleanup_env_vars();
}

#[test]
fn test_validation_rejects_bad_sections() {
    let _guard = lock_env();

    let cases = [
        (MINIMAL.replace("sk_test_minimal", ""), "api_key"),
        (
            MINIMAL.replace("http://localhost:8086", "localhost:8086"),
            "influxdb.url",
        ),
        (
            MINIMAL.replace("bucket = \"energy\"", ""),
            "influxdb.bucket",
        ),
        (
            format!("{MINIMAL}\n[schedule]\nmax_parallel_streams = 0\n"),
            "max_parallel_streams",
        ),
        (
            MINIMAL.replace(
                "serial_number = \"21L1234567\"",
                "serial_number = \"21L1234567\"\nunit = \"m3\"",
            ),
            "unit",
        ),
    ];

    for (content, needle) in cases {
        let file = write_config(&content);
        let err = load_config(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(
            err.to_string().contains(needle),
            "expected '{needle}' in: {err}"
        );
    }
}

#[test]
fn test_duplicate_stream_ids_rejected() {
    let _guard = lock_env();
    let duplicated = format!(
        "{MINIMAL}\n[[streams]]\nkind = \"electricity_consumption\"\nmeter_point = \"1200012345678\"\nserial_number = \"21L7654321\"\n"
    );
    let file = write_config(&duplicated);

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Duplicate stream id"));
}

#[test]
fn test_missing_file() {
    let _guard = lock_env();
    let err = load_config("/nonexistent/octograph.toml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("not found"));
}
