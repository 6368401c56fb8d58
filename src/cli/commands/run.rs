//! Run command implementation
//!
//! This module implements the `run` command: one cycle with `--once`,
//! otherwise the polling loop until a shutdown signal arrives.

use crate::config::{load_config, parse_start_from, split_list, OctographConfig, ScheduleMode};
use crate::core::scheduler::{CycleReport, Scheduler, EXIT_CONFIG, EXIT_OK, EXIT_STARTUP};
use crate::domain::ErrorKind;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Start every stream's window here instead of its watermark (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Restrict the run to these stream ids (comma-separated)
    #[arg(long, value_name = "IDS")]
    pub stream: Option<String>,

    /// Fetch and normalize, but write nothing and keep watermarks
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if let Err(e) = self.apply_overrides(&mut config) {
            tracing::error!(error = %e, "Invalid command-line override");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        if config.application.dry_run {
            tracing::info!("Dry run mode enabled - no data will be written");
            println!("🔍 DRY RUN MODE - No data will be written to InfluxDB");
            println!();
        }

        let scheduler = match Scheduler::from_config(&config).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize scheduler");
                eprintln!("Failed to initialize: {e}");
                return Ok(match e.kind() {
                    ErrorKind::Configuration => EXIT_CONFIG,
                    _ => EXIT_STARTUP,
                });
            }
        };

        match config.schedule.mode {
            ScheduleMode::Once => {
                println!("🚀 Running one cycle over {} stream(s)...", scheduler.streams().len());
                println!();
                let report = scheduler.run_once(shutdown_signal).await;
                print_report(&report);
                Ok(report.exit_code())
            }
            ScheduleMode::Daemon => {
                println!(
                    "🚀 Polling {} stream(s) every {}s (Ctrl+C to stop)",
                    scheduler.streams().len(),
                    config.schedule.poll_interval_seconds
                );
                let cycles = scheduler.run_daemon(shutdown_signal).await;
                println!();
                println!("Stopped after {cycles} cycle(s).");
                Ok(EXIT_OK)
            }
        }
    }

    /// Apply command-line flags on top of the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns a message if `--from` does not parse or the result fails
    /// validation.
    pub fn apply_overrides(&self, config: &mut OctographConfig) -> Result<(), String> {
        if self.once {
            config.schedule.mode = ScheduleMode::Once;
        }

        if let Some(from) = &self.from {
            parse_start_from(from)?;
            tracing::info!(start_from = %from, "Overriding start date from CLI");
            config.schedule.start_from = Some(from.clone());
        }

        if let Some(streams) = &self.stream {
            let ids = split_list(streams);
            tracing::info!(streams = ?ids, "Overriding stream selection from CLI");
            config.schedule.streams = ids;
        }

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        config.validate()
    }
}

fn print_report(report: &CycleReport) {
    println!("📊 Cycle Summary:");
    for stream in &report.streams {
        let window = stream
            .window
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<40} {:<12} {:>6} points  {}",
            stream.stream_id.as_str(),
            stream.outcome.label(),
            stream.outcome.points_written(),
            window
        );
    }
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());
    println!();

    for failed in report.failures() {
        if let crate::core::scheduler::StreamOutcome::Failed { kind, message } = &failed.outcome {
            println!("  ❌ {} ({kind}): {message}", failed.stream_id);
        }
    }

    if report.interrupted {
        println!("⚠️  Run interrupted. Watermarks reflect the last completed write.");
    } else if report.is_successful() {
        println!("✅ Cycle completed successfully!");
    } else {
        println!("⚠️  Cycle completed with failures");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OctographConfig {
        let toml = r#"
[octopus]
api_key = "sk_test"
account = "A-1234ABCD"

[[streams]]
id = "house"
kind = "electricity_consumption"
meter_point = "1200012345678"
serial_number = "21L1234567"

[[streams]]
id = "gas"
kind = "gas_consumption"
meter_point = "1234567890"
serial_number = "E6S1234567"

[influxdb]
url = "http://localhost:8086"
token = "token"
org = "home"
bucket = "energy"
"#;
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_run_args_defaults_keep_config() {
        let mut config = config();
        RunArgs::default().apply_overrides(&mut config).unwrap();

        assert_eq!(config.schedule.mode, ScheduleMode::Daemon);
        assert!(config.schedule.start_from.is_none());
        assert!(config.schedule.streams.is_empty());
        assert!(!config.application.dry_run);
    }

    #[test]
    fn test_run_args_overrides() {
        let mut config = config();
        let args = RunArgs {
            once: true,
            from: Some("2024-01-01".to_string()),
            stream: Some("house, gas".to_string()),
            dry_run: true,
        };
        args.apply_overrides(&mut config).unwrap();

        assert_eq!(config.schedule.mode, ScheduleMode::Once);
        assert_eq!(config.schedule.start_from.as_deref(), Some("2024-01-01"));
        assert_eq!(config.schedule.streams, vec!["house", "gas"]);
        assert!(config.application.dry_run);
    }

    #[test]
    fn test_run_args_rejects_bad_date() {
        let mut config = config();
        let args = RunArgs {
            from: Some("yesterday".to_string()),
            ..RunArgs::default()
        };
        assert!(args.apply_overrides(&mut config).is_err());
    }

    #[test]
    fn test_run_args_rejects_unknown_stream() {
        let mut config = config();
        let args = RunArgs {
            stream: Some("boiler".to_string()),
            ..RunArgs::default()
        };
        let err = args.apply_overrides(&mut config).unwrap_err();
        assert!(err.contains("boiler"));
    }
}
