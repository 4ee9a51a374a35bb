//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Load Order
//!
//! 1. Defaults
//! 2. TOML file named by `CC_CONFIG`, if set
//! 3. Environment overrides (`CC_HTTP_PORT`, `CC_API_KEY`, `CC_DATA_DIR`,
//!    `CC_ANCHOR_ENABLED`, `CC_VALIDITY_DAYS`, plus the telemetry variables)
//! 4. `validate()`

use std::path::{Path, PathBuf};

use cc_02_certificate_registry::RegistryConfig;
use cc_03_verification_log::FraudPolicy;
use cc_04_ledger_anchor::adapters::local::LOCAL_NETWORK;
use cc_05_api_gateway::GatewayConfig;
use certchain_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_ENV: &str = "CC_CONFIG";

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// REST gateway configuration.
    pub gateway: GatewayConfig,
    /// Issuance and verification rules.
    pub registry: RegistryConfig,
    /// Verification log heuristics.
    pub fraud: FraudPolicy,
    /// Ledger anchoring.
    pub anchor: AnchorConfig,
    /// Persistence.
    pub storage: StorageConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

/// Ledger anchoring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Run with a ledger at all.
    pub enabled: bool,
    /// Network name written into receipts.
    pub network: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            network: LOCAL_NETWORK.to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the certificate snapshot and audit log.
    /// `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// fsync the audit log after every verification.
    pub sync_audit_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            sync_audit_writes: true,
        }
    }
}

impl StorageConfig {
    pub fn certificates_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("certificates.json"))
    }

    pub fn audit_log_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("verifications.jsonl"))
    }

    pub fn ledger_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|d| d.join("ledger.jsonl"))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: &'static str, value: String },

    #[error(transparent)]
    Gateway(#[from] cc_05_api_gateway::domain::ConfigError),

    #[error("invalid registry configuration: {0}")]
    Registry(String),

    #[error("invalid anchor configuration: {0}")]
    Anchor(String),
}

impl NodeConfig {
    /// Defaults, then `CC_CONFIG`, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.telemetry = config.telemetry.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `CC_*` overrides read through `lookup`.
    ///
    /// Unset or empty variables are ignored; unparsable ones are errors.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        };

        if let Some((key, value)) = get("CC_HTTP_PORT") {
            self.gateway.http.port = value
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key, value })?;
        }
        if let Some((_, value)) = get("CC_API_KEY") {
            self.gateway.auth.api_key = Some(value);
        }
        if let Some((_, value)) = get("CC_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(value));
        }
        if let Some((key, value)) = get("CC_ANCHOR_ENABLED") {
            self.anchor.enabled = parse_bool(&value).ok_or(ConfigError::InvalidEnv { key, value })?;
        }
        if let Some((key, value)) = get("CC_VALIDITY_DAYS") {
            self.registry.validity_days = match value.as_str() {
                "none" | "never" => None,
                days => Some(
                    days.parse()
                        .map_err(|_| ConfigError::InvalidEnv { key, value: value.clone() })?,
                ),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;
        self.registry
            .validate()
            .map_err(|e| ConfigError::Registry(e.to_string()))?;
        if self.anchor.enabled && self.anchor.network.trim().is_empty() {
            return Err(ConfigError::Anchor("network must not be empty".into()));
        }
        Ok(())
    }

    /// Production readiness: everything in `validate` plus issuer credentials.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.gateway.validate_for_production()?;
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
