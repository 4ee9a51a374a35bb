use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{CertificateId, CourseId, Hash, LearnerId, Timestamp};
use tracing::{info, warn};

use super::memory::CertificateIndex;
use crate::domain::{Certificate, StoreError};
use crate::ports::CertificateStore;

const SNAPSHOT_VERSION: u32 = 1;

/// Counter updates held in memory before the snapshot is rewritten.
pub const DEFAULT_COUNTER_FLUSH_EVERY: usize = 64;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    certificates: Vec<Certificate>,
}

/// JSON snapshot store.
///
/// Each `put` rewrites the whole snapshot to a temp file, syncs it and
/// renames it over the previous one, so readers never see a partial file.
///
/// Verification counters are batched: the snapshot is rewritten every
/// `flush_every` counter updates, on the next `put`, on `flush` and on drop.
pub struct FileCertificateStore {
    path: PathBuf,
    index: RwLock<CertificateIndex>,
    /// Counter updates not yet in the snapshot. Changed under the index write lock.
    pending: AtomicUsize,
    flush_every: usize,
}

impl FileCertificateStore {
    /// Open the snapshot at `path`, starting empty if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let index = match std::fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(StoreError::Corrupt(format!(
                        "unsupported snapshot version {}",
                        snapshot.version
                    )));
                }
                CertificateIndex::from_certificates(snapshot.certificates)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CertificateIndex::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            certificates = index.len(),
            "Certificate store opened"
        );

        Ok(Self {
            path,
            index: RwLock::new(index),
            pending: AtomicUsize::new(0),
            flush_every: DEFAULT_COUNTER_FLUSH_EVERY,
        })
    }

    /// Rewrite the snapshot after every `every` counter updates (minimum 1).
    pub fn with_counter_flush(mut self, every: usize) -> Self {
        self.flush_every = every.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counter updates not yet written to disk.
    pub fn pending_counters(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    fn save(&self, index: &CertificateIndex) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            certificates: index.filtered(|_| true),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl CertificateStore for FileCertificateStore {
    fn get(&self, id: &CertificateId) -> Result<Option<Certificate>, StoreError> {
        Ok(self.index.read().get(id).cloned())
    }

    fn put(&self, certificate: Certificate) -> Result<(), StoreError> {
        let mut index = self.index.write();
        let mut next = index.clone();
        next.insert(certificate);
        self.save(&next)?;
        *index = next;
        self.pending.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn find_by_hash(&self, hash: &Hash) -> Result<Option<Certificate>, StoreError> {
        Ok(self.index.read().find_by_hash(hash).cloned())
    }

    fn record_verification(&self, id: &CertificateId, at: Timestamp) -> Result<bool, StoreError> {
        let mut index = self.index.write();
        if !index.record_verification(id, at) {
            return Ok(false);
        }
        let pending = self.pending.fetch_add(1, Ordering::Relaxed) + 1;
        if pending >= self.flush_every {
            self.save(&index)?;
            self.pending.store(0, Ordering::Relaxed);
        }
        Ok(true)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let index = self.index.write();
        if self.pending.load(Ordering::Relaxed) > 0 {
            self.save(&index)?;
            self.pending.store(0, Ordering::Relaxed);
        }
        Ok(())
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

impl Drop for FileCertificateStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(
                path = %self.path.display(),
                pending = self.pending_counters(),
                error = %e,
                "Failed to flush verification counters"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{content_hash, CertificateStatus};
    use cc_01_eligibility::Grade;
    use std::collections::BTreeMap;

    fn certificate(id: &str, learner: &str, issued_at: u64) -> Certificate {
        let mut c = Certificate {
            certificate_id: CertificateId::parse(id).unwrap(),
            learner_id: LearnerId::parse(learner).unwrap(),
            learner_name: "Grace Hopper".into(),
            course_id: CourseId::parse("cobol-1").unwrap(),
            course_title: "COBOL".into(),
            final_score: 80.0,
            grade: Grade::Merit,
            completed_at: issued_at - 10,
            issued_at,
            issuer: "Academy".into(),
            content_hash: [0; 32],
            status: CertificateStatus::Active,
            revocation: None,
            anchor: None,
            verification_count: 0,
            last_verified_at: None,
            display_name_override: None,
            metadata: BTreeMap::new(),
            expires_at: None,
        };
        c.content_hash = content_hash(&c);
        c
    }

    #[test]
    fn test_put_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store/certificates.json");
        let a = certificate("CERT-A", "l1", 200);
        let b = certificate("CERT-B", "l1", 100);
        {
            let store = FileCertificateStore::open(&path).unwrap();
            store.put(a.clone()).unwrap();
            store.put(b.clone()).unwrap();
        }

        let store = FileCertificateStore::open(&path).unwrap();
        assert_eq!(store.get(&a.certificate_id).unwrap(), Some(a.clone()));
        assert_eq!(
            store.find_by_hash(&b.content_hash).unwrap(),
            Some(b.clone())
        );
        let listed = store.list_by_learner(&a.learner_id).unwrap();
        assert_eq!(listed, vec![b, a]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_replace_updates_hash_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCertificateStore::open(dir.path().join("c.json")).unwrap();
        let original = certificate("CERT-A", "l1", 100);
        store.put(original.clone()).unwrap();

        let mut changed = original.clone();
        changed.content_hash = [7; 32];
        store.put(changed).unwrap();

        assert!(store.find_by_hash(&original.content_hash).unwrap().is_none());
        assert!(store.find_by_hash(&[7; 32]).unwrap().is_some());
    }

    #[test]
    fn test_garbage_snapshot_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            FileCertificateStore::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_find_active_skips_revoked() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCertificateStore::open(dir.path().join("c.json")).unwrap();
        let mut revoked = certificate("CERT-OLD", "l1", 100);
        revoked.status = CertificateStatus::Revoked;
        store.put(revoked).unwrap();
        assert!(store
            .find_active(
                &LearnerId::parse("l1").unwrap(),
                &CourseId::parse("cobol-1").unwrap()
            )
            .unwrap()
            .is_none());

        let active = certificate("CERT-NEW", "l1", 200);
        store.put(active.clone()).unwrap();
        assert_eq!(
            store
                .find_active(&active.learner_id, &active.course_id)
                .unwrap(),
            Some(active)
        );
    }

    #[test]
    fn test_counters_batched_until_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let store = FileCertificateStore::open(&path)
            .unwrap()
            .with_counter_flush(3);
        let a = certificate("CERT-A", "l1", 100);
        store.put(a.clone()).unwrap();
        let written = std::fs::read(&path).unwrap();

        assert!(store.record_verification(&a.certificate_id, 500).unwrap());
        assert!(store.record_verification(&a.certificate_id, 600).unwrap());
        assert_eq!(store.pending_counters(), 2);
        assert_eq!(std::fs::read(&path).unwrap(), written);
        let live = store.get(&a.certificate_id).unwrap().unwrap();
        assert_eq!(live.verification_count, 2);
        assert_eq!(live.last_verified_at, Some(600));

        store.record_verification(&a.certificate_id, 700).unwrap();
        assert_eq!(store.pending_counters(), 0);
        let reopened = FileCertificateStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(&a.certificate_id).unwrap().unwrap().verification_count,
            3
        );

        assert!(!store
            .record_verification(&CertificateId::parse("CERT-MISSING").unwrap(), 800)
            .unwrap());
        assert_eq!(store.pending_counters(), 0);
    }

    #[test]
    fn test_pending_counters_flushed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let a = certificate("CERT-A", "l1", 100);
        {
            let store = FileCertificateStore::open(&path).unwrap();
            store.put(a.clone()).unwrap();
            store.record_verification(&a.certificate_id, 500).unwrap();
            assert_eq!(store.pending_counters(), 1);
        }

        let store = FileCertificateStore::open(&path).unwrap();
        let stored = store.get(&a.certificate_id).unwrap().unwrap();
        assert_eq!(stored.verification_count, 1);
        assert_eq!(stored.last_verified_at, Some(500));
        assert!(crate::domain::verify_integrity(&stored));
    }
}
