//! # Domain Layer
//!
//! Entries, fraud policy, scoring heuristics and the entry hash chain.
//! No I/O: persistence goes through the `AuditSink` port.

pub mod chain;
pub mod entities;
pub mod errors;
pub mod policy;
pub mod scoring;

pub use chain::{compute_entry_hash, ChainReport};
pub use entities::*;
pub use errors::*;
pub use policy::FraudPolicy;
pub use scoring::assess;
