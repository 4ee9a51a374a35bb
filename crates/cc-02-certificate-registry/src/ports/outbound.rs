//! # Outbound Ports (Driven Ports)
//!
//! Persistence required by the registry service.

use shared_types::{CertificateId, CourseId, Hash, LearnerId, Timestamp};

use crate::domain::{Certificate, StoreError};

/// Certificate persistence.
///
/// Production: `FileCertificateStore`
/// Testing: `InMemoryCertificateStore`
///
/// Lists are ordered by `issued_at`, then id.
pub trait CertificateStore: Send + Sync {
    fn get(&self, id: &CertificateId) -> Result<Option<Certificate>, StoreError>;

    /// Insert or replace by `certificate_id`.
    fn put(&self, certificate: Certificate) -> Result<(), StoreError>;

    fn find_by_hash(&self, hash: &Hash) -> Result<Option<Certificate>, StoreError>;

    /// Bump `verification_count` and set `last_verified_at`. Returns whether
    /// the certificate exists.
    ///
    /// Counters are not covered by the content hash, so an adapter may hold
    /// them back and persist them in batches.
    fn record_verification(&self, id: &CertificateId, at: Timestamp) -> Result<bool, StoreError>;

    /// Persist anything held back by `record_verification`.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// The active certificate for a learner and course, if any.
    fn find_active(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, StoreError>;

    fn list_by_learner(&self, learner_id: &LearnerId) -> Result<Vec<Certificate>, StoreError>;

    fn list_by_course(&self, course_id: &CourseId) -> Result<Vec<Certificate>, StoreError>;

    fn all(&self) -> Result<Vec<Certificate>, StoreError>;
}
