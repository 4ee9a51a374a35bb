//! Telemetry configuration.

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name, reported once when logging starts
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or full `EnvFilter` directive
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "certchain".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay environment variables on an existing configuration.
    ///
    /// # Environment Variables
    ///
    /// - `CC_SERVICE_NAME`: Service name
    /// - `CC_LOG_LEVEL` or `RUST_LOG`: Log level
    /// - `CC_JSON_LOGS`: Enable JSON logs (default: on inside containers)
    pub fn with_env_overrides(mut self) -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        if let Ok(name) = env::var("CC_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Ok(level) = env::var("CC_LOG_LEVEL").or_else(|_| env::var("RUST_LOG")) {
            self.log_level = level;
        }
        match env::var("CC_JSON_LOGS") {
            Ok(v) => self.json_logs = parse_flag(&v),
            Err(_) if is_container => self.json_logs = true,
            Err(_) => {}
        }
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "certchain");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }

    #[test]
    fn test_partial_toml_section() {
        let config: TelemetryConfig = toml::from_str("json_logs = true").unwrap();
        assert!(config.json_logs);
        assert_eq!(config.log_level, "info");
    }
}
