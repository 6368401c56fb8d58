//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Octograph configuration file.

use crate::config::{load_config, OctographConfig};
use crate::core::scheduler::{EXIT_CONFIG, EXIT_OK};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates every section
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        for line in summary_lines(&config) {
            println!("{line}");
        }
        println!();
        Ok(EXIT_OK)
    }
}

fn summary_lines(config: &OctographConfig) -> Vec<String> {
    let mut lines = vec![
        "Configuration Summary:".to_string(),
        format!("  Log Level: {}", config.application.log_level),
        format!("  Dry Run: {}", config.application.dry_run),
        format!("  Octopus API: {}", config.octopus.base_url),
        format!(
            "  InfluxDB: {} (v{})",
            config.influxdb.url, config.influxdb.version
        ),
    ];

    match config.influxdb.version {
        2 => lines.push(format!(
            "  Bucket: {} (org {})",
            config.influxdb.bucket.as_deref().unwrap_or("-"),
            config.influxdb.org.as_deref().unwrap_or("-")
        )),
        _ => lines.push(format!(
            "  Database: {}",
            config.influxdb.database.as_deref().unwrap_or("-")
        )),
    }

    lines.push(format!("  Schedule Mode: {:?}", config.schedule.mode));
    lines.push(format!(
        "  Poll Interval: {}s",
        config.schedule.poll_interval_seconds
    ));
    lines.push(format!("  State Backend: {:?}", config.state.backend));

    // validate() already built every stream
    if let Ok(streams) = config.meter_streams() {
        lines.push(format!("  Streams ({}):", streams.len()));
        for stream in streams {
            let selected = config.schedule.streams.is_empty()
                || config
                    .schedule
                    .streams
                    .iter()
                    .any(|s| s == stream.id.as_str());
            lines.push(format!(
                "    {} {} [{}] meter {} serial {}{}",
                if selected { "•" } else { "-" },
                stream.id,
                stream.kind,
                stream.meter_point,
                stream.serial_number,
                if stream.tariff.is_some() { " (tariff)" } else { "" }
            ));
        }
    }

    lines
}
