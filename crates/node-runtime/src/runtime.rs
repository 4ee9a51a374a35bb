//! Node lifecycle: start the gateway, wait for a shutdown signal, drain.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::container::{NodeConfig, NodeContainer};

/// The main node runtime.
pub struct NodeRuntime {
    container: Arc<NodeContainer>,
}

impl NodeRuntime {
    /// Create a new node runtime with configuration.
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating CertChain node runtime");
        Ok(Self {
            container: Arc::new(NodeContainer::new(config)?),
        })
    }

    pub fn from_container(container: NodeContainer) -> Self {
        Self {
            container: Arc::new(container),
        }
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<NodeContainer> {
        Arc::clone(&self.container)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.container.config.gateway.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        self.run_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn run_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let config = &self.container.config;
        info!("===========================================");
        info!("  CertChain Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(issuer = %config.registry.issuer, "Issuer");
        info!(
            anchoring = config.anchor.enabled,
            network = %config.anchor.network,
            "Ledger"
        );
        match &config.storage.data_dir {
            Some(dir) => info!(data_dir = %dir.display(), "Persistent storage"),
            None => warn!("No data_dir configured; certificates are lost on restart"),
        }
        if config.gateway.auth.api_key.is_none() {
            warn!("No API key configured; issuer and admin routes are disabled");
        }

        let gateway = self.container.gateway()?;
        gateway
            .serve_on(listener, shutdown)
            .await
            .context("API gateway failed")?;

        if let Err(e) = self.container.registry.flush() {
            warn!(error = %e, "Failed to flush verification counters");
        }
        info!("Shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("Shutdown signal received, draining connections");
}
