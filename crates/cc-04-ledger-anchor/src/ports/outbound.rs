//! # Outbound Ports (Driven Ports)
//!
//! Production deployments plug a real chain client in here. The node ships
//! with `LocalLedger`.

use async_trait::async_trait;
use shared_types::Hash;

use crate::domain::{AnchorError, AnchorReceipt, AnchoredRecord};

/// Ledger that stores one content hash per certificate.
#[async_trait]
pub trait LedgerAnchor: Send + Sync {
    /// Write `content_hash` for `certificate_id`.
    ///
    /// # Errors
    ///
    /// `AlreadyAnchored` if the certificate already has a record.
    async fn anchor(
        &self,
        certificate_id: &str,
        content_hash: Hash,
    ) -> Result<AnchorReceipt, AnchorError>;

    /// Record for `certificate_id`, if any.
    async fn lookup(&self, certificate_id: &str) -> Result<Option<AnchoredRecord>, AnchorError>;

    /// Network name written into receipts.
    fn network(&self) -> &str;
}
