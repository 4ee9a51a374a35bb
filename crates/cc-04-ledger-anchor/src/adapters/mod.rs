//! # Adapters Module
//!
//! - `local`: ledger used by the node and tests
//! - `journal`: JSON-lines block file behind `LocalLedger::open`

mod journal;
pub mod local;

pub use local::LocalLedger;
