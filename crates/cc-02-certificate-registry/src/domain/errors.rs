//! # Domain Errors

use cc_01_eligibility::{EligibilityError, EligibilityGap};
use cc_03_verification_log::LogError;
use cc_04_ledger_anchor::AnchorError;
use shared_types::{CertificateId, IdError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("certificate {0} not found")]
    NotFound(String),

    /// Learner has not met the course requirements.
    #[error("learner is not eligible: {} unmet requirement(s)", gaps.len())]
    NotEligible { gaps: Vec<EligibilityGap> },

    /// An active certificate already exists for this learner and course.
    #[error("an active certificate already exists: {certificate_id}")]
    AlreadyIssued { certificate_id: CertificateId },

    #[error("certificate {0} is already revoked")]
    AlreadyRevoked(CertificateId),

    #[error("certificate {0} is already anchored")]
    AlreadyAnchored(CertificateId),

    /// Operation not allowed on a revoked certificate.
    #[error("certificate {0} is revoked")]
    CertificateRevoked(CertificateId),

    /// Patch tried to change a field covered by the content hash.
    #[error("field '{field}' is immutable")]
    ImmutableField { field: &'static str },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    InvalidId(#[from] IdError),

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error("ledger error: {0}")]
    Anchor(#[from] AnchorError),

    /// The verification could not be written to the audit log.
    #[error("audit log error: {0}")]
    Audit(#[from] LogError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Failures of a `CertificateStore` adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Serialization(String),

    /// Snapshot holds two certificates with the same id or content hash.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}
