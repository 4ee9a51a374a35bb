use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    /// The certificate already has a record on the ledger.
    #[error("certificate {certificate_id} is already anchored")]
    AlreadyAnchored { certificate_id: String },

    /// The ledger cannot be reached.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger refused the submission.
    #[error("ledger rejected anchor: {0}")]
    Rejected(String),

    /// The ledger journal could not be read or written.
    #[error("ledger storage error: {0}")]
    Storage(String),
}
