//! # Ledger Anchor Subsystem (cc-04)
//!
//! Publishes certificate content hashes to an append-only ledger so a
//! verifier can check a certificate against a record the registry cannot
//! silently rewrite.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | INVARIANT-1 | One anchor per certificate | `anchor` returns `AlreadyAnchored` |
//! | INVARIANT-2 | Append-only blocks | No API removes or edits a block |
//! | INVARIANT-3 | Linked blocks | `parent_hash` = previous `block_hash`, genesis parent = 0 |
//!
//! ## Adapters
//!
//! - `LocalLedger`: hash-chained ledger, in memory or journaled to a file,
//!   switchable offline.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::LocalLedger;
pub use domain::{
    confirm, AnchorCheck, AnchorError, AnchorReceipt, AnchoredRecord, LedgerBlock,
    LedgerChainReport,
};
pub use ports::LedgerAnchor;
