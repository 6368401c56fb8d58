//! Status command implementation
//!
//! This module implements the `status` command for displaying stream
//! watermarks.

use crate::config::{load_config, StateBackend};
use crate::core::scheduler::{EXIT_CONFIG, EXIT_OK, EXIT_STARTUP};
use crate::core::state::{create_watermark_store, CycleStatus, Watermark, WatermarkBook};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Filter by stream id
    #[arg(long)]
    pub stream: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking ingestion status");

        println!("📊 Ingestion Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        if config.state.backend == StateBackend::Memory {
            println!("State backend is 'memory'; watermarks are not kept between runs.");
            return Ok(EXIT_OK);
        }

        let streams = match config.meter_streams() {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Invalid stream configuration");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let streams: Vec<_> = streams
            .into_iter()
            .filter(|s| self.matches(s.id.as_str()))
            .collect();

        if streams.is_empty() {
            println!("No streams match the specified filter.");
            return Ok(EXIT_OK);
        }

        let book = match create_watermark_store(&config.state, &config.influxdb) {
            Ok(store) => WatermarkBook::load(store, &streams).await,
            Err(e) => Err(e),
        };
        let book = match book {
            Ok(b) => b,
            Err(e) => {
                println!("❌ Failed to load watermarks");
                println!("   Error: {e}");
                return Ok(EXIT_STARTUP);
            }
        };

        println!(
            "{:<40} {:<15} {:<27} {:<10} {:<20}",
            "Stream", "Status", "Ingested Until", "Points", "Last Cycle"
        );
        println!("{}", "-".repeat(112));

        for stream in &streams {
            println!("{}", format_row(&book.get(&stream.id)));
        }

        println!();
        Ok(EXIT_OK)
    }

    fn matches(&self, stream_id: &str) -> bool {
        self.stream.as_deref().map_or(true, |wanted| wanted == stream_id)
    }
}

fn status_label(watermark: &Watermark) -> &'static str {
    match watermark.last_cycle_status {
        CycleStatus::Completed => "✅ Completed",
        CycleStatus::InProgress => "🔄 In Progress",
        CycleStatus::NoData => "⏸️  No Data",
        CycleStatus::Failed => "❌ Failed",
        CycleStatus::NotStarted => "⏸️  Not Started",
    }
}

fn format_row(watermark: &Watermark) -> String {
    let ingested_until = watermark
        .ingested_until
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "Never".to_string());
    let last_cycle = watermark
        .last_cycle_completed_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Never".to_string());

    let mut row = format!(
        "{:<40} {:<15} {:<27} {:<10} {:<20}",
        watermark.stream_id.as_str(),
        status_label(watermark),
        ingested_until,
        watermark.points_written,
        last_cycle
    );
    if let Some(error) = &watermark.last_error {
        row.push_str(&format!("\n    last error: {error}"));
    }
    row
}
