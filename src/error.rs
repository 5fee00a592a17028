//! Error taxonomy for the monitor
//!
//! `Setup` and `Config` come out of `Monitor::new` and stop the process;
//! everything else is logged by the cycle driver and retried on the next tick.

use crate::config::ConfigError;
use crate::monitor_core::sample::ParseError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("source file {path} unavailable: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compact {path}: {source}")]
    Compaction {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("setup failed: {0}")]
    Setup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_config_errors_convert() {
        let parse: MonitorError = ParseError::FieldCount(1).into();
        assert!(matches!(parse, MonitorError::Parse(ParseError::FieldCount(1))));
        assert!(parse.to_string().starts_with("parse error"));

        let config: MonitorError = ConfigError::InvalidValue("x".to_string()).into();
        assert!(matches!(config, MonitorError::Config(_)));
    }

    #[test]
    fn test_display_names_the_path() {
        let err = MonitorError::WriteFailure {
            path: PathBuf::from("logs/all_measurements.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("logs/all_measurements.log"));
    }
}
