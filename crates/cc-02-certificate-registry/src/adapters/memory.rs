use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use shared_types::{CertificateId, CourseId, Hash, LearnerId, Timestamp};

use crate::domain::{Certificate, StoreError};
use crate::ports::CertificateStore;

/// Certificates keyed by id, with a content-hash index.
#[derive(Debug, Default, Clone)]
pub(crate) struct CertificateIndex {
    by_id: BTreeMap<CertificateId, Certificate>,
    by_hash: HashMap<Hash, CertificateId>,
}

impl CertificateIndex {
    pub(crate) fn from_certificates(certificates: Vec<Certificate>) -> Result<Self, StoreError> {
        let mut index = Self::default();
        for certificate in certificates {
            if index.by_id.contains_key(&certificate.certificate_id) {
                return Err(StoreError::Corrupt(format!(
                    "duplicate certificate id {}",
                    certificate.certificate_id
                )));
            }
            index.insert(certificate);
        }
        Ok(index)
    }

    pub(crate) fn insert(&mut self, certificate: Certificate) {
        if let Some(previous) = self.by_id.get(&certificate.certificate_id) {
            self.by_hash.remove(&previous.content_hash);
        }
        self.by_hash
            .insert(certificate.content_hash, certificate.certificate_id.clone());
        self.by_id
            .insert(certificate.certificate_id.clone(), certificate);
    }

    pub(crate) fn get(&self, id: &CertificateId) -> Option<&Certificate> {
        self.by_id.get(id)
    }

    /// Counters only; the hash index is untouched.
    pub(crate) fn record_verification(&mut self, id: &CertificateId, at: Timestamp) -> bool {
        match self.by_id.get_mut(id) {
            Some(certificate) => {
                certificate.verification_count += 1;
                certificate.last_verified_at = Some(at);
                true
            }
            None => false,
        }
    }

    pub(crate) fn find_by_hash(&self, hash: &Hash) -> Option<&Certificate> {
        self.by_hash.get(hash).and_then(|id| self.by_id.get(id))
    }

    pub(crate) fn filtered<F>(&self, keep: F) -> Vec<Certificate>
    where
        F: Fn(&Certificate) -> bool,
    {
        let mut out: Vec<Certificate> = self.by_id.values().filter(|c| keep(c)).cloned().collect();
        out.sort_by(|a, b| {
            a.issued_at
                .cmp(&b.issued_at)
                .then_with(|| a.certificate_id.cmp(&b.certificate_id))
        });
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// Volatile store for tests and throwaway nodes.
#[derive(Default)]
pub struct InMemoryCertificateStore {
    index: RwLock<CertificateIndex>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a stored certificate without any checks.
    ///
    /// Lets tests simulate out-of-band tampering with the backing store.
    pub fn tamper<F>(&self, id: &CertificateId, edit: F) -> bool
    where
        F: FnOnce(&mut Certificate),
    {
        let mut index = self.index.write();
        match index.get(id).cloned() {
            Some(mut certificate) => {
                edit(&mut certificate);
                index.insert(certificate);
                true
            }
            None => false,
        }
    }
}

impl CertificateStore for InMemoryCertificateStore {
    fn get(&self, id: &CertificateId) -> Result<Option<Certificate>, StoreError> {
        Ok(self.index.read().get(id).cloned())
    }

    fn put(&self, certificate: Certificate) -> Result<(), StoreError> {
        self.index.write().insert(certificate);
        Ok(())
    }

    fn find_by_hash(&self, hash: &Hash) -> Result<Option<Certificate>, StoreError> {
        Ok(self.index.read().find_by_hash(hash).cloned())
    }

    fn record_verification(&self, id: &CertificateId, at: Timestamp) -> Result<bool, StoreError> {
        Ok(self.index.write().record_verification(id, at))
    }

    fn find_active(
        &self,
        learner_id: &LearnerId,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, StoreError> {
        Ok(self
            .index
            .read()
            .filtered(|c| &c.learner_id == learner_id && &c.course_id == course_id && c.is_active())
            .into_iter()
            .next())
    }

    fn list_by_learner(&self, learner_id: &LearnerId) -> Result<Vec<Certificate>, StoreError> {
        Ok(self.index.read().filtered(|c| &c.learner_id == learner_id))
    }

    fn list_by_course(&self, course_id: &CourseId) -> Result<Vec<Certificate>, StoreError> {
        Ok(self.index.read().filtered(|c| &c.course_id == course_id))
    }

    fn all(&self) -> Result<Vec<Certificate>, StoreError> {
        Ok(self.index.read().filtered(|_| true))
    }
}
