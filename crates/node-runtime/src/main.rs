//! # CertChain Node
//!
//! Issues and verifies course certificates over a REST API.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults → `CC_CONFIG` TOML → `CC_*` env)
//! 2. Initialize logging and register Prometheus metrics
//! 3. Open storage, restore the verification log, start the ledger
//! 4. Serve the gateway until Ctrl+C / SIGTERM, then drain

use anyhow::{Context, Result};
use certchain_telemetry::{init_logging, register_metrics};
use node_runtime::{shutdown_signal, NodeConfig, NodeRuntime};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("Failed to load configuration")?;

    init_logging(&config.telemetry).context("Failed to initialize logging")?;
    register_metrics().context("Failed to register metrics")?;

    if let Err(e) = config.validate_for_production() {
        warn!(error = %e, "Configuration is not production ready");
    }

    let runtime = NodeRuntime::new(config)?;
    runtime.run(shutdown_signal()).await
}
