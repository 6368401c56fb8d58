//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Octograph using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Octograph - Octopus Energy to InfluxDB bridge
#[derive(Parser, Debug)]
#[command(name = "octograph")]
#[command(version, about, long_about = None)]
#[command(author = "Octograph Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "octograph.toml", env = "OCTOGRAPH_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "OCTOGRAPH_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest readings into InfluxDB (polls until stopped unless --once)
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show stream watermarks
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["octograph", "run"]);
        assert_eq!(cli.config, "octograph.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli = Cli::parse_from([
            "octograph",
            "run",
            "--once",
            "--from",
            "2024-01-01",
            "--stream",
            "house,gas",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.once);
                assert!(args.dry_run);
                assert_eq!(args.from.as_deref(), Some("2024-01-01"));
                assert_eq!(args.stream.as_deref(), Some("house,gas"));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["octograph", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["octograph", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["octograph", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["octograph", "status", "--stream", "house"]);
        match cli.command {
            Commands::Status(args) => assert_eq!(args.stream.as_deref(), Some("house")),
            other => panic!("expected status, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["octograph", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
