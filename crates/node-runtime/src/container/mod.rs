//! # Node Container
//!
//! Builds every subsystem from a [`NodeConfig`] and hands out the shared
//! instances.
//!
//! ## Wiring
//!
//! ```text
//! TimeSource ──┬──► LocalLedger (if anchor.enabled, journaled if data_dir)
//!              ├──► VerificationLog ◄── JsonLinesSink (if data_dir)
//!              └──► CertificateService ◄── FileCertificateStore | InMemoryCertificateStore
//!                          │
//!                          ▼
//!                   ApiGatewayService
//! ```

pub mod config;

pub use config::{AnchorConfig, ConfigError, NodeConfig, StorageConfig};

use std::sync::Arc;

use anyhow::{Context, Result};
use cc_02_certificate_registry::{
    CertificateService, CertificateStore, FileCertificateStore, InMemoryCertificateStore,
};
use cc_03_verification_log::{JsonLinesSink, VerificationLog};
use cc_04_ledger_anchor::{LedgerAnchor, LocalLedger};
use cc_05_api_gateway::ApiGatewayService;
use shared_types::{SystemTimeSource, TimeSource};

const SUBSYSTEM: &str = "node";
use certchain_telemetry::log_event;

/// Shared subsystem instances.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub clock: Arc<dyn TimeSource>,
    pub ledger: Option<Arc<LocalLedger>>,
    pub log: Arc<VerificationLog>,
    pub registry: Arc<CertificateService>,
}

impl NodeContainer {
    /// Wire all subsystems against the system clock.
    pub fn new(config: NodeConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Wire all subsystems against `clock`.
    pub fn with_clock(config: NodeConfig, clock: Arc<dyn TimeSource>) -> Result<Self> {
        if let Some(dir) = &config.storage.data_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        }

        let store: Arc<dyn CertificateStore> = match config.storage.certificates_path() {
            Some(path) => {
                let store = FileCertificateStore::open(&path).with_context(|| {
                    format!("Failed to open certificate store {}", path.display())
                })?;
                log_event!(info, SUBSYSTEM, "Certificate store opened", path = %path.display());
                Arc::new(store)
            }
            None => {
                log_event!(info, SUBSYSTEM, "Using in-memory certificate store");
                Arc::new(InMemoryCertificateStore::new())
            }
        };

        let log = match config.storage.audit_log_path() {
            Some(path) => {
                let sink = JsonLinesSink::open_with_sync(&path, config.storage.sync_audit_writes)
                    .with_context(|| format!("Failed to open audit log {}", path.display()))?;
                let log =
                    VerificationLog::with_sink(config.fraud.clone(), Arc::new(sink), clock.clone())
                        .context("Failed to restore verification log")?;
                log_event!(
                    info,
                    SUBSYSTEM,
                    "Verification log restored",
                    path = %path.display(),
                    entries = log.len()
                );
                log
            }
            None => VerificationLog::new(config.fraud.clone(), clock.clone()),
        };
        let log = Arc::new(log);

        let ledger = if !config.anchor.enabled {
            None
        } else if let Some(path) = config.storage.ledger_path() {
            let ledger = LocalLedger::open(&path, config.anchor.network.clone(), clock.clone())
                .with_context(|| format!("Failed to open ledger journal {}", path.display()))?;
            log_event!(
                info,
                SUBSYSTEM,
                "Ledger anchoring enabled",
                network = %config.anchor.network,
                path = %path.display(),
                height = ledger.height()
            );
            Some(Arc::new(ledger))
        } else {
            log_event!(info, SUBSYSTEM, "Ledger anchoring enabled", network = %config.anchor.network);
            Some(Arc::new(LocalLedger::new(
                config.anchor.network.clone(),
                clock.clone(),
            )))
        };

        let registry = CertificateService::new(
            config.registry.clone(),
            store,
            Arc::clone(&log),
            ledger
                .as_ref()
                .map(|l| Arc::clone(l) as Arc<dyn LedgerAnchor>),
            clock.clone(),
        )
        .context("Failed to create certificate registry")?;

        Ok(Self {
            config,
            clock,
            ledger,
            log,
            registry: Arc::new(registry),
        })
    }

    /// Build the REST gateway over this container.
    pub fn gateway(&self) -> Result<ApiGatewayService> {
        ApiGatewayService::new(
            self.config.gateway.clone(),
            self.registry.clone(),
            Arc::clone(&self.log),
            self.ledger.clone(),
        )
        .context("Failed to create API gateway")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_02_certificate_registry::CertificateRegistryApi;
    use shared_types::ManualTimeSource;

    #[test]
    fn test_in_memory_wiring() {
        let container =
            NodeContainer::with_clock(NodeConfig::default(), Arc::new(ManualTimeSource::new(1_000)))
                .unwrap();
        assert!(container.ledger.is_some());
        assert!(container.log.is_empty());
        assert_eq!(container.registry.stats().unwrap().total, 0);
        assert!(container.gateway().is_ok());
    }

    #[test]
    fn test_anchor_disabled() {
        let mut config = NodeConfig::default();
        config.anchor.enabled = false;
        let container = NodeContainer::new(config).unwrap();
        assert!(container.ledger.is_none());
        assert_eq!(container.registry.anchor_network(), None);
    }

    #[test]
    fn test_data_dir_created() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.storage.data_dir = Some(dir.path().join("nested"));
        let _container = NodeContainer::new(config).unwrap();
        assert!(dir.path().join("nested").is_dir());
        assert!(dir.path().join("nested/verifications.jsonl").exists());
    }
}
