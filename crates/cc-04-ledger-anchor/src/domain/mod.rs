//! # Domain Layer
//!
//! Receipts, ledger blocks and the confirmation check.

pub mod block;
pub mod confirm;
pub mod entities;
pub mod errors;

pub use block::{LedgerBlock, LedgerChainReport};
pub use confirm::{confirm, AnchorCheck};
pub use entities::{AnchorReceipt, AnchoredRecord};
pub use errors::AnchorError;
