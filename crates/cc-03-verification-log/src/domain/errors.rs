//! # Domain Errors
//!
//! Failures of the audit trail. A verification whose entry cannot be made
//! durable is reported as failed rather than silently unlogged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    /// The sink could not persist or read entries.
    #[error("audit sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry could not be decoded.
    #[error("corrupt audit entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },

    /// A stored entry does not link to its predecessor.
    #[error("audit chain broken at sequence {sequence}")]
    ChainBroken { sequence: u64 },

    /// Entry could not be encoded for the sink.
    #[error("audit entry serialization failed: {0}")]
    Serialization(String),
}
