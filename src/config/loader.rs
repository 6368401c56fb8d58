//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{OctographConfig, ScheduleMode, StateBackend};
use super::secret::secret_string;
use crate::domain::errors::OctographError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`OctographConfig`]
/// 4. Applies environment variable overrides (`OCTOGRAPH_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`OctographError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, an override has
/// a bad value, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use octograph::config::loader::load_config;
///
/// let config = load_config("octograph.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<OctographConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(OctographError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        OctographError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: OctographConfig = toml::from_str(&contents)
        .map_err(|e| OctographError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        OctographError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched so sample configs can mention variables
/// that aren't set.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| OctographError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(OctographError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        OctographError::Configuration(format!("Invalid value '{value}' for {name}"))
    })
}

/// Applies environment variable overrides using the `OCTOGRAPH_*` prefix
///
/// Variables follow the pattern `OCTOGRAPH_<SECTION>_<KEY>`, for example
/// `OCTOGRAPH_OCTOPUS_API_KEY` or `OCTOGRAPH_INFLUXDB_BUCKET`.
/// `OCTOGRAPH_STREAMS` restricts the run to a comma-separated list of stream ids.
fn apply_env_overrides(config: &mut OctographConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env("OCTOGRAPH_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val.to_lowercase();
    }
    if let Some(val) = env("OCTOGRAPH_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_env("OCTOGRAPH_APPLICATION_DRY_RUN", &val)?;
    }

    // Provider overrides
    if let Some(val) = env("OCTOGRAPH_OCTOPUS_BASE_URL") {
        config.octopus.base_url = val;
    }
    if let Some(val) = env("OCTOGRAPH_OCTOPUS_API_KEY") {
        config.octopus.api_key = secret_string(val);
    }
    if let Some(val) = env("OCTOGRAPH_OCTOPUS_ACCOUNT") {
        config.octopus.account = Some(val);
    }
    if let Some(val) = env("OCTOGRAPH_OCTOPUS_PAGE_SIZE") {
        config.octopus.page_size = parse_env("OCTOGRAPH_OCTOPUS_PAGE_SIZE", &val)?;
    }
    if let Some(val) = env("OCTOGRAPH_OCTOPUS_MIN_REQUEST_INTERVAL_MS") {
        config.octopus.min_request_interval_ms =
            parse_env("OCTOGRAPH_OCTOPUS_MIN_REQUEST_INTERVAL_MS", &val)?;
    }

    // Database overrides
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_VERSION") {
        config.influxdb.version = parse_env("OCTOGRAPH_INFLUXDB_VERSION", &val)?;
    }
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_URL") {
        config.influxdb.url = val;
    }
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_TOKEN") {
        config.influxdb.token = Some(secret_string(val));
    }
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_ORG") {
        config.influxdb.org = Some(val);
    }
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_BUCKET") {
        config.influxdb.bucket = Some(val);
    }
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_DATABASE") {
        config.influxdb.database = Some(val);
    }
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_USERNAME") {
        config.influxdb.username = Some(val);
    }
    if let Some(val) = env("OCTOGRAPH_INFLUXDB_PASSWORD") {
        config.influxdb.password = Some(secret_string(val));
    }

    // Schedule overrides
    if let Some(val) = env("OCTOGRAPH_SCHEDULE_MODE") {
        config.schedule.mode =
            ScheduleMode::from_str(&val).map_err(OctographError::Configuration)?;
    }
    if let Some(val) = env("OCTOGRAPH_SCHEDULE_POLL_INTERVAL_SECONDS") {
        config.schedule.poll_interval_seconds =
            parse_env("OCTOGRAPH_SCHEDULE_POLL_INTERVAL_SECONDS", &val)?;
    }
    if let Some(val) = env("OCTOGRAPH_SCHEDULE_START_FROM") {
        config.schedule.start_from = Some(val);
    }
    if let Some(val) = env("OCTOGRAPH_SCHEDULE_MAX_PARALLEL_STREAMS") {
        config.schedule.max_parallel_streams =
            parse_env("OCTOGRAPH_SCHEDULE_MAX_PARALLEL_STREAMS", &val)?;
    }
    if let Some(val) = env("OCTOGRAPH_STREAMS") {
        config.schedule.streams = split_list(&val);
    }

    // State overrides
    if let Some(val) = env("OCTOGRAPH_STATE_BACKEND") {
        config.state.backend =
            StateBackend::from_str(&val).map_err(OctographError::Configuration)?;
    }
    if let Some(val) = env("OCTOGRAPH_STATE_PATH") {
        config.state.path = val;
    }

    // Logging overrides
    if let Some(val) = env("OCTOGRAPH_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("OCTOGRAPH_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env("OCTOGRAPH_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("OCTOGRAPH_LOGGING_CONSOLE_FORMAT") {
        config.logging.console_format = val.to_lowercase();
    }

    Ok(())
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("OCTOGRAPH_LOADER_TEST_KEY", "sk_test_1");
        let input = "api_key = \"${OCTOGRAPH_LOADER_TEST_KEY}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_key = \"sk_test_1\"\n");
        std::env::remove_var("OCTOGRAPH_LOADER_TEST_KEY");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("OCTOGRAPH_LOADER_MISSING");
        let input = "token = \"${OCTOGRAPH_LOADER_MISSING}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("OCTOGRAPH_LOADER_MISSING"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("OCTOGRAPH_LOADER_COMMENTED");
        let input = "# token = \"${OCTOGRAPH_LOADER_COMMENTED}\"\nvalue = 1";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${OCTOGRAPH_LOADER_COMMENTED}"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[octopus]
api_key = "sk_test_abc"
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

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.octopus.base_url, "https://api.octopus.energy");
        assert_eq!(config.streams.len(), 1);
        assert_eq!(config.influxdb.version, 2);
    }
}
