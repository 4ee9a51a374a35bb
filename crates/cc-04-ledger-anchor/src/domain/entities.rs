//! # Domain Entities

use serde::{Deserialize, Serialize};
use shared_types::{Hash, Timestamp};

/// Proof that a content hash was written to a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    /// Ledger the hash was written to.
    pub network: String,
    /// Hex transaction id.
    pub transaction_id: String,
    pub block_height: u64,
    pub anchored_at: Timestamp,
}

/// What the ledger holds for one certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredRecord {
    pub certificate_id: String,
    pub content_hash: Hash,
    pub receipt: AnchorReceipt,
}
