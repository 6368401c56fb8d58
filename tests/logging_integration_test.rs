//! Integration tests for logging functionality
//!
//! A global subscriber can only be installed once per process, so everything
//! that calls `init_logging` successfully lives in a single test.

use octograph::config::LoggingConfig;
use octograph::core::scheduler::StreamOutcome;
use octograph::domain::{ErrorKind, ProviderError, StreamId};
use octograph::logging::init_logging;
use octograph::{log_retry_attempt, log_stream_outcome};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.console_format, "text");
}

#[test]
fn test_invalid_level_is_rejected() {
    let err = init_logging("verbose", &LoggingConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("verbose"));
}

#[test]
fn test_file_logging_creates_directory_and_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
        console_format: "json".to_string(),
    };
    assert!(!log_path.exists());

    let guard = init_logging("debug", &config).unwrap();

    let stream_id = StreamId::new("electricity-1200012345678").unwrap();
    log_stream_outcome!(&stream_id, &StreamOutcome::NoData, None::<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)>);
    let reason = ProviderError::Timeout("30s".to_string());
    log_retry_attempt!("fetch_intervals", 1, 4, Duration::from_millis(500), &reason);
    drop(guard);

    assert!(log_path.is_dir());
    let files: Vec<_> = std::fs::read_dir(&log_path)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    assert!(
        files.iter().any(|name| name.starts_with("octograph.log")),
        "no log file in {files:?}"
    );

    // A second global subscriber is refused
    assert!(init_logging("info", &LoggingConfig::default()).is_err());
}
