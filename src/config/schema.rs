//! Host configuration schema.
//!
//! All types derive Serde traits for deserialization from a TOML file.
//! Every section has defaults, so an empty file is valid.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// Root configuration for the bindings host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Where platform documents are read from.
    pub sources: SourcesConfig,

    /// Live reload settings.
    pub watch: WatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Document file locations. An absent path falls back to the environment variable.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SourcesConfig {
    /// Application descriptor (instead of `VCAP_APPLICATION`).
    pub application_path: Option<PathBuf>,

    /// Service bindings (instead of `VCAP_SERVICES`).
    pub services_path: Option<PathBuf>,

    /// Local settings document (appsettings-style JSON).
    pub settings_path: Option<PathBuf>,
}

impl SourcesConfig {
    pub fn has_files(&self) -> bool {
        self.application_path.is_some() || self.services_path.is_some() || self.settings_path.is_some()
    }
}

/// File watching configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Reload when a document file changes.
    pub enabled: bool,

    /// Poll interval for watcher backends that poll.
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert!(!config.watch.enabled);
        assert_eq!(config.watch.poll_interval_secs, 2);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.sources.has_files());
    }

    #[test]
    fn test_partial_sections() {
        let config: HostConfig = toml::from_str(
            r#"
            [sources]
            services_path = "/etc/vcap/services.json"

            [watch]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(
            config.sources.services_path.as_deref(),
            Some(std::path::Path::new("/etc/vcap/services.json"))
        );
        assert!(config.watch.enabled);
        assert_eq!(config.watch.poll_interval_secs, 2);
    }
}
