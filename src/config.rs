//! Monitor configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const ALL_MEASUREMENTS_LOG: &str = "all_measurements.log";
pub const HOURLY_AVERAGE_LOG: &str = "hourly_average.log";
pub const DAILY_AVERAGE_LOG: &str = "daily_average.log";

const MAX_CHECK_SECS: u64 = 366 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration for the monitor runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Growing source file written by the sensor
    pub source_path: PathBuf,

    /// Directory holding the three logs
    pub log_dir: PathBuf,

    /// Seconds between cycles
    pub poll_interval_secs: u64,

    /// Elapsed seconds before the hourly bucket is checked
    pub hourly_check_secs: u64,

    /// Elapsed seconds before the daily bucket may flush at midnight
    pub daily_check_secs: u64,

    /// Optional JSON file the ingestion cursor is persisted to
    pub cursor_state_path: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("virtual_port.txt"),
            log_dir: PathBuf::from("."),
            poll_interval_secs: 10,
            hourly_check_secs: 3_600,
            daily_check_secs: 82_800,
            cursor_state_path: None,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `TEMPFLOW_SOURCE_PATH` (default: virtual_port.txt)
    /// - `TEMPFLOW_LOG_DIR` (default: .)
    /// - `TEMPFLOW_POLL_INTERVAL_SECS` (default: 10)
    /// - `TEMPFLOW_HOURLY_CHECK_SECS` (default: 3600)
    /// - `TEMPFLOW_DAILY_CHECK_SECS` (default: 82800)
    /// - `TEMPFLOW_CURSOR_STATE_PATH` (default: unset, cursor kept in memory)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            source_path: lookup("TEMPFLOW_SOURCE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_path),
            log_dir: lookup("TEMPFLOW_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            poll_interval_secs: parse_secs(
                &lookup,
                "TEMPFLOW_POLL_INTERVAL_SECS",
                defaults.poll_interval_secs,
            )?,
            hourly_check_secs: parse_secs(
                &lookup,
                "TEMPFLOW_HOURLY_CHECK_SECS",
                defaults.hourly_check_secs,
            )?,
            daily_check_secs: parse_secs(
                &lookup,
                "TEMPFLOW_DAILY_CHECK_SECS",
                defaults.daily_check_secs,
            )?,
            cursor_state_path: lookup("TEMPFLOW_CURSOR_STATE_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "poll interval must be at least 1 second".to_string(),
            ));
        }
        if self.hourly_check_secs == 0 || self.daily_check_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "check intervals must be at least 1 second".to_string(),
            ));
        }
        if self.hourly_check_secs > MAX_CHECK_SECS || self.daily_check_secs > MAX_CHECK_SECS {
            return Err(ConfigError::InvalidValue(
                "check intervals cannot exceed one year".to_string(),
            ));
        }
        if self.source_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "source path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn hourly_check(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.hourly_check_secs as i64)
    }

    pub fn daily_check(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.daily_check_secs as i64)
    }

    pub fn all_measurements_path(&self) -> PathBuf {
        self.log_dir.join(ALL_MEASUREMENTS_LOG)
    }

    pub fn hourly_average_path(&self) -> PathBuf {
        self.log_dir.join(HOURLY_AVERAGE_LOG)
    }

    pub fn daily_average_path(&self) -> PathBuf {
        self.log_dir.join(DAILY_AVERAGE_LOG)
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    key, raw
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.source_path, PathBuf::from("virtual_port.txt"));
        assert_eq!(config.log_dir, PathBuf::from("."));
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.hourly_check_secs, 3_600);
        assert_eq!(config.daily_check_secs, 82_800);
        assert!(config.cursor_state_path.is_none());
        assert_eq!(
            config.all_measurements_path(),
            PathBuf::from("./all_measurements.log")
        );
    }

    #[test]
    fn test_custom_config() {
        let config = MonitorConfig::from_lookup(lookup_from(&[
            ("TEMPFLOW_SOURCE_PATH", "/dev/ttyUSB0.txt"),
            ("TEMPFLOW_LOG_DIR", "/var/log/tempflow"),
            ("TEMPFLOW_POLL_INTERVAL_SECS", "2"),
            ("TEMPFLOW_HOURLY_CHECK_SECS", "10"),
            ("TEMPFLOW_DAILY_CHECK_SECS", "30"),
            ("TEMPFLOW_CURSOR_STATE_PATH", "/var/lib/tempflow/cursor.json"),
        ]))
        .unwrap();

        assert_eq!(config.source_path, PathBuf::from("/dev/ttyUSB0.txt"));
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.hourly_check_secs, 10);
        assert_eq!(config.daily_check_secs, 30);
        assert_eq!(
            config.daily_average_path(),
            PathBuf::from("/var/log/tempflow/daily_average.log")
        );
        assert_eq!(
            config.cursor_state_path,
            Some(PathBuf::from("/var/lib/tempflow/cursor.json"))
        );
    }

    #[test]
    fn test_rejects_bad_intervals() {
        let zero = MonitorConfig::from_lookup(lookup_from(&[("TEMPFLOW_POLL_INTERVAL_SECS", "0")]));
        assert!(zero.is_err());

        let garbage = MonitorConfig::from_lookup(lookup_from(&[("TEMPFLOW_HOURLY_CHECK_SECS", "hourly")]));
        assert!(matches!(garbage, Err(ConfigError::InvalidValue(_))));

        let huge = MonitorConfig::from_lookup(lookup_from(&[("TEMPFLOW_DAILY_CHECK_SECS", "99999999999")]));
        assert!(huge.is_err());
    }
}
