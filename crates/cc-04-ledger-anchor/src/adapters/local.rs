//! # Local Ledger
//!
//! Append-only ledger. Every anchor seals one block linked to the previous
//! one, so rewriting a stored hash breaks the chain.
//!
//! `new` keeps blocks in memory; `open` journals them to a file and refuses
//! to start on a journal whose chain does not verify.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{hash_to_hex, Hash, TimeSource, ZERO_HASH};
use tracing::info;

use super::journal::BlockJournal;
use crate::domain::block::verify_blocks;
use crate::domain::{AnchorError, AnchorReceipt, AnchoredRecord, LedgerBlock, LedgerChainReport};
use crate::ports::LedgerAnchor;

/// Default network name.
pub const LOCAL_NETWORK: &str = "certchain-local";

#[derive(Default)]
struct LedgerState {
    blocks: Vec<LedgerBlock>,
    by_certificate: HashMap<String, usize>,
    journal: Option<BlockJournal>,
}

pub struct LocalLedger {
    network: String,
    clock: Arc<dyn TimeSource>,
    online: AtomicBool,
    state: RwLock<LedgerState>,
}

impl LocalLedger {
    pub fn new(network: impl Into<String>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            network: network.into(),
            clock,
            online: AtomicBool::new(true),
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Open a journaled ledger at `path`, replaying and verifying its blocks.
    pub fn open(
        path: impl AsRef<Path>,
        network: impl Into<String>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, AnchorError> {
        let path = path.as_ref();
        let (journal, blocks) = BlockJournal::open(path)?;

        let report = verify_blocks(&blocks);
        if !report.intact {
            return Err(AnchorError::Storage(format!(
                "{}: chain broken at block {}",
                path.display(),
                report.first_broken.unwrap_or_default()
            )));
        }

        let mut by_certificate = HashMap::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            if by_certificate
                .insert(block.certificate_id.clone(), index)
                .is_some()
            {
                return Err(AnchorError::Storage(format!(
                    "{}: certificate {} anchored twice",
                    path.display(),
                    block.certificate_id
                )));
            }
        }

        let ledger = Self::new(network, clock);
        *ledger.state.write() = LedgerState {
            blocks,
            by_certificate,
            journal: Some(journal),
        };
        Ok(ledger)
    }

    /// Simulate an outage. While offline every call returns `Unavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Number of sealed blocks.
    pub fn height(&self) -> u64 {
        self.state.read().blocks.len() as u64
    }

    pub fn blocks(&self) -> Vec<LedgerBlock> {
        self.state.read().blocks.clone()
    }

    pub fn verify_chain(&self) -> LedgerChainReport {
        verify_blocks(&self.state.read().blocks)
    }

    fn ensure_online(&self) -> Result<(), AnchorError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(AnchorError::Unavailable(format!(
                "{} is offline",
                self.network
            )))
        }
    }

    fn receipt(&self, block: &LedgerBlock) -> AnchorReceipt {
        AnchorReceipt {
            network: self.network.clone(),
            transaction_id: block.transaction_id(),
            block_height: block.height,
            anchored_at: block.timestamp,
        }
    }
}

#[async_trait]
impl LedgerAnchor for LocalLedger {
    async fn anchor(
        &self,
        certificate_id: &str,
        content_hash: Hash,
    ) -> Result<AnchorReceipt, AnchorError> {
        self.ensure_online()?;
        if certificate_id.is_empty() {
            return Err(AnchorError::Rejected("empty certificate id".into()));
        }

        let mut state = self.state.write();
        if state.by_certificate.contains_key(certificate_id) {
            return Err(AnchorError::AlreadyAnchored {
                certificate_id: certificate_id.to_string(),
            });
        }

        let parent = state
            .blocks
            .last()
            .map(|b| b.block_hash)
            .unwrap_or(ZERO_HASH);
        let height = state.blocks.len() as u64 + 1;
        let block = LedgerBlock::seal(
            height,
            parent,
            self.clock.now(),
            certificate_id,
            content_hash,
        );
        let receipt = self.receipt(&block);
        if let Some(journal) = state.journal.as_mut() {
            journal.append(&block)?;
        }

        let index = state.blocks.len();
        state.by_certificate.insert(certificate_id.to_string(), index);
        state.blocks.push(block);
        drop(state);

        info!(
            certificate_id,
            network = %self.network,
            block_height = height,
            content_hash = %hash_to_hex(&content_hash),
            "Certificate anchored"
        );
        Ok(receipt)
    }

    async fn lookup(&self, certificate_id: &str) -> Result<Option<AnchoredRecord>, AnchorError> {
        self.ensure_online()?;
        let state = self.state.read();
        Ok(state
            .by_certificate
            .get(certificate_id)
            .and_then(|idx| state.blocks.get(*idx))
            .map(|block| AnchoredRecord {
                certificate_id: block.certificate_id.clone(),
                content_hash: block.content_hash,
                receipt: self.receipt(block),
            }))
    }

    fn network(&self) -> &str {
        &self.network
    }
}
