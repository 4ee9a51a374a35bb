//! # Ledger Blocks
//!
//! One block per anchored certificate. Integers are hashed big-endian and
//! the certificate id is length-prefixed.

use serde::{Deserialize, Serialize};
use shared_types::{sha256_parts, Hash, Timestamp, ZERO_HASH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBlock {
    pub height: u64,
    #[serde(with = "shared_types::hex_hash")]
    pub parent_hash: Hash,
    pub timestamp: Timestamp,
    pub certificate_id: String,
    #[serde(with = "shared_types::hex_hash")]
    pub content_hash: Hash,
    #[serde(with = "shared_types::hex_hash")]
    pub block_hash: Hash,
}

impl LedgerBlock {
    /// Seal a block on top of `parent_hash`.
    pub fn seal(
        height: u64,
        parent_hash: Hash,
        timestamp: Timestamp,
        certificate_id: &str,
        content_hash: Hash,
    ) -> Self {
        let mut block = Self {
            height,
            parent_hash,
            timestamp,
            certificate_id: certificate_id.to_string(),
            content_hash,
            block_hash: ZERO_HASH,
        };
        block.block_hash = block.compute_hash();
        block
    }

    pub fn compute_hash(&self) -> Hash {
        sha256_parts(&[
            &self.height.to_be_bytes(),
            &self.parent_hash,
            &self.timestamp.to_be_bytes(),
            &(self.certificate_id.len() as u32).to_be_bytes(),
            self.certificate_id.as_bytes(),
            &self.content_hash,
        ])
    }

    /// Transaction id reported in the receipt.
    pub fn transaction_id(&self) -> String {
        hex::encode(sha256_parts(&[
            &(self.certificate_id.len() as u32).to_be_bytes(),
            self.certificate_id.as_bytes(),
            &self.content_hash,
            &self.height.to_be_bytes(),
        ]))
    }
}

/// Result of walking the ledger from genesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerChainReport {
    pub intact: bool,
    pub blocks: u64,
    pub first_broken: Option<u64>,
}

/// Check heights, parent links and block hashes.
pub fn verify_blocks(blocks: &[LedgerBlock]) -> LedgerChainReport {
    let mut parent = ZERO_HASH;
    for (expected_height, block) in (1u64..).zip(blocks) {
        if block.height != expected_height
            || block.parent_hash != parent
            || block.compute_hash() != block.block_hash
        {
            return LedgerChainReport {
                intact: false,
                blocks: blocks.len() as u64,
                first_broken: Some(block.height),
            };
        }
        parent = block.block_hash;
    }

    LedgerChainReport {
        intact: true,
        blocks: blocks.len() as u64,
        first_broken: None,
    }
}
