//! Host configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before any document is ingested

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::HostConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic rule, collecting all failures.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.watch.enabled && !config.sources.has_files() {
        errors.push(ValidationError {
            field: "watch.enabled",
            message: "watching requires at least one document path in [sources]".into(),
        });
    }
    if config.watch.poll_interval_secs == 0 {
        errors.push(ValidationError {
            field: "watch.poll_interval_secs",
            message: "must be greater than zero".into(),
        });
    }
    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!("unknown level `{}`", config.observability.log_level),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!("invalid socket address `{}`", config.observability.metrics_address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&HostConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = HostConfig::default();
        config.watch.enabled = true;
        config.watch.poll_interval_secs = 0;
        config.observability.log_level = "loud".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "watch.enabled",
                "watch.poll_interval_secs",
                "observability.log_level",
                "observability.metrics_address",
            ]
        );
    }

    #[test]
    fn test_watch_with_file_source() {
        let mut config = HostConfig::default();
        config.watch.enabled = true;
        config.sources.services_path = Some(PathBuf::from("services.json"));
        assert!(validate_config(&config).is_ok());
    }
}
