//! # Ports Layer
//!
//! - `outbound.rs` - Driven port implemented by ledger adapters

pub mod outbound;

pub use outbound::LedgerAnchor;
