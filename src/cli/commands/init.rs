//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::core::scheduler::{EXIT_CONFIG, EXIT_OK, EXIT_STARTUP};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "octograph.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Octograph configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your account and meters", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set OCTOPUS_API_KEY");
                println!("     - Set INFLUXDB_TOKEN (InfluxDB 2.x)");
                println!("  3. Validate configuration: octograph validate-config");
                println!("  4. Run one cycle: octograph run --once");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_STARTUP)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Octograph Configuration File
# Octopus Energy to InfluxDB bridge

[application]
log_level = "info"
dry_run = false

[octopus]
api_key = "${OCTOPUS_API_KEY}"
account = "A-1234ABCD"

[[streams]]
kind = "electricity_consumption"
meter_point = "1200012345678"
serial_number = "21L1234567"

[[streams]]
kind = "gas_consumption"
meter_point = "1234567890"
serial_number = "E6S12345678901"
unit = "m3"

[influxdb]
version = 2
url = "http://localhost:8086"
token = "${INFLUXDB_TOKEN}"
org = "home"
bucket = "energy"

[schedule]
mode = "daemon"
poll_interval_seconds = 1800

[state]
backend = "file"
path = "octograph-state.json"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Octograph Configuration File
# Octopus Energy to InfluxDB bridge
#
# This file contains all configuration options with examples and explanations.
# Values of the form ${VAR} are read from the environment (or a .env file).
# Any setting can also be overridden with OCTOGRAPH_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
log_level = "info"

# Fetch and normalize but write nothing and keep watermarks
dry_run = false

# ============================================================================
# Octopus Energy API
# ============================================================================
[octopus]
base_url = "https://api.octopus.energy"

# API key from your Octopus dashboard, sent as the basic-auth username
api_key = "${OCTOPUS_API_KEY}"

# Default account for streams that don't name one
account = "A-1234ABCD"

# Request timeout in seconds
timeout_seconds = 30

# Results per page and a hard cap on pages followed per fetch
page_size = 100
max_pages = 500

# Minimum spacing between requests in milliseconds (0 disables)
min_request_interval_ms = 250

[octopus.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0
jitter = true

# ============================================================================
# Streams
# ============================================================================
# kind: electricity_consumption | gas_consumption | electricity_cost
# The stream id defaults to <measurement>-<meter_point>.

[[streams]]
id = "house"
kind = "electricity_consumption"
meter_point = "1200012345678"
serial_number = "21L1234567"
interval_minutes = 30

# Optional tariff: adds unit_rate, cost, standing_charge and total_cost fields
[streams.tariff]
unit_rate_high = 28.62
unit_rate_low = 7.50
low_start = "00:30"
low_end = "04:30"
time_zone = "Europe/London"
standing_charge = 53.35
# standing_charge_url = "https://api.octopus.energy/v1/products/.../standing-charges/"

[[streams]]
kind = "gas_consumption"
meter_point = "1234567890"
serial_number = "E6S12345678901"
# SMETS2 gas meters report cubic metres
unit = "m3"
volume_correction_factor = 1.02264
calorific_value = 39.5

# Agile unit rates
# [[streams]]
# kind = "electricity_cost"
# meter_point = "1200012345678"
# serial_number = "21L1234567"
# product_code = "AGILE-FLEX-22-11-25"
# tariff_code = "E-1R-AGILE-FLEX-22-11-25-C"

# ============================================================================
# InfluxDB
# ============================================================================
[influxdb]
# 2 for the /api/v2/write API, 1 for /write
version = 2
url = "http://localhost:8086"

# 2.x
token = "${INFLUXDB_TOKEN}"
org = "home"
bucket = "energy"

# 1.x
# database = "energy"
# username = "octograph"
# password = "${INFLUXDB_PASSWORD}"

timeout_seconds = 30

[influxdb.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0
jitter = true

# ============================================================================
# Schedule
# ============================================================================
[schedule]
# daemon (loop) or once (one cycle, then exit)
mode = "daemon"

# Time between cycle starts
poll_interval_seconds = 1800

# Readings newer than now - lag are left for a later cycle
publication_lag_minutes = 60

# How far back a stream without a watermark starts
initial_lookback_hours = 168

# Upper bound on one window (0 = unbounded) and lower bound before skipping
max_window_hours = 0
min_window_minutes = 30

# Streams processed concurrently
max_parallel_streams = 1

# Backfill from this date on the next run (RFC 3339 or YYYY-MM-DD)
# start_from = "2024-01-01"

# Only run these streams (empty = all)
# streams = ["house"]

# ============================================================================
# Watermark State
# ============================================================================
[state]
# memory | file | influxdb
backend = "file"
path = "octograph-state.json"

# ============================================================================
# Logging
# ============================================================================
[logging]
# text or json
console_format = "text"

# Rolling JSON log files
local_enabled = false
local_path = "./logs"

# daily, hourly or never
local_rotation = "daily"
"#
        .to_string()
    }
}
