//! # Inbound Ports (Driving Ports)
//!
//! Public API of the registry, consumed by the REST gateway.

use async_trait::async_trait;
use cc_01_eligibility::{CourseOutline, EligibilityReport, LearnerProgress};
use cc_04_ledger_anchor::AnchorReceipt;
use shared_types::{CertificateId, CourseId, LearnerId, RequestContext};

use crate::domain::{
    Certificate, CertificatePatch, IssueRequest, RegistryError, RegistryStats, VerificationResult,
};

#[async_trait]
pub trait CertificateRegistryApi: Send + Sync {
    /// Issue a certificate to an eligible learner.
    ///
    /// ## Errors
    ///
    /// - `NotEligible`: requirements unmet, with the gaps
    /// - `AlreadyIssued`: an active certificate exists for this learner and course
    /// - `InvalidRequest`: bad learner name
    async fn issue(&self, request: IssueRequest) -> Result<Certificate, RegistryError>;

    /// Evaluate eligibility without issuing anything.
    fn check_eligibility(
        &self,
        outline: &CourseOutline,
        progress: &LearnerProgress,
    ) -> Result<EligibilityReport, RegistryError>;

    fn get(&self, id: &CertificateId) -> Result<Certificate, RegistryError>;

    fn list_by_learner(&self, learner_id: &LearnerId) -> Result<Vec<Certificate>, RegistryError>;

    fn list_by_course(&self, course_id: &CourseId) -> Result<Vec<Certificate>, RegistryError>;

    /// Look up by hex content hash.
    fn find_by_hash(&self, hash_hex: &str) -> Result<Certificate, RegistryError>;

    /// Anchor an existing, unanchored, active certificate.
    async fn anchor(&self, id: &CertificateId) -> Result<AnchorReceipt, RegistryError>;

    /// Public verification. Always writes one audit entry.
    ///
    /// Only audit or storage failures are errors; every verdict, including
    /// not-found, is an `Ok` result.
    async fn verify(
        &self,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<VerificationResult, RegistryError>;

    /// Verification by hex content hash.
    async fn verify_by_hash(
        &self,
        hash_hex: &str,
        ctx: &RequestContext,
    ) -> Result<VerificationResult, RegistryError>;

    fn revoke(
        &self,
        id: &CertificateId,
        reason: &str,
        revoked_by: &str,
    ) -> Result<Certificate, RegistryError>;

    fn update(
        &self,
        id: &CertificateId,
        patch: &CertificatePatch,
    ) -> Result<Certificate, RegistryError>;

    fn stats(&self) -> Result<RegistryStats, RegistryError>;
}
