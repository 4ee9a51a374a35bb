//! # Certificate Service
//!
//! Implements [`CertificateRegistryApi`] over a [`CertificateStore`], the
//! verification log and an optional ledger.
//!
//! Read-modify-write sequences on the store run under `write_lock`. The
//! lock is never held across an `.await`; ledger calls happen outside it
//! and their results are merged back into the latest stored copy.

use std::sync::Arc;

use async_trait::async_trait;
use cc_01_eligibility::{
    CourseOutline, EligibilityApi, EligibilityReport, EligibilityService, LearnerProgress,
};
use cc_03_verification_log::{VerificationAttempt, VerificationLog, VerificationOutcome};
use cc_04_ledger_anchor::{confirm, AnchorCheck, AnchorError, AnchorReceipt, LedgerAnchor};
use certchain_telemetry::{
    log_certificate_event, ANCHOR_FAILURES, CERTIFICATES_ISSUED, CERTIFICATES_REVOKED,
    SUSPICIOUS_VERIFICATIONS, VERIFICATIONS,
};
use parking_lot::Mutex;
use shared_types::{
    hash_from_hex, hash_to_hex, CertificateId, CourseId, LearnerId, RequestContext, TimeSource,
    Timestamp, SECS_PER_DAY, ZERO_HASH,
};
use tracing::{debug, warn};

use crate::domain::value_objects::{MAX_LEARNER_NAME_LEN, MAX_REASON_LEN};
use crate::domain::{
    apply_patch, content_hash, new_certificate_id, verify_integrity, Certificate,
    CertificatePatch, CertificateStatus, IssueRequest, RegistryConfig, RegistryError,
    RegistryStats, Revocation, StoreError, VerificationResult,
};
use crate::ports::{CertificateRegistryApi, CertificateStore};

const SUBSYSTEM: &str = "registry";

/// Attempts at drawing an unused certificate id before giving up.
const MAX_ID_ATTEMPTS: usize = 4;

pub struct CertificateService {
    config: RegistryConfig,
    eligibility: EligibilityService,
    store: Arc<dyn CertificateStore>,
    log: Arc<VerificationLog>,
    anchor: Option<Arc<dyn LedgerAnchor>>,
    clock: Arc<dyn TimeSource>,
    write_lock: Mutex<()>,
}

impl CertificateService {
    pub fn new(
        config: RegistryConfig,
        store: Arc<dyn CertificateStore>,
        log: Arc<VerificationLog>,
        anchor: Option<Arc<dyn LedgerAnchor>>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, RegistryError> {
        config.validate()?;
        let eligibility = EligibilityService::new(config.eligibility.clone())?;
        Ok(Self {
            config,
            eligibility,
            store,
            log,
            anchor,
            clock,
            write_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn verification_log(&self) -> &Arc<VerificationLog> {
        &self.log
    }

    /// Name of the configured ledger network, if any.
    pub fn anchor_network(&self) -> Option<&str> {
        self.anchor.as_deref().map(|a| a.network())
    }

    /// Write out verification counters the store is holding back.
    pub fn flush(&self) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock();
        Ok(self.store.flush()?)
    }

    fn fresh_id(&self, issued_at: Timestamp) -> Result<CertificateId, RegistryError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = new_certificate_id(issued_at)?;
            if self.store.get(&id)?.is_none() {
                return Ok(id);
            }
        }
        Err(StoreError::Corrupt("could not allocate an unused certificate id".into()).into())
    }

    fn load(&self, id: &CertificateId) -> Result<Certificate, RegistryError> {
        self.store
            .get(id)?
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Write `receipt` into the stored copy of `id`.
    fn store_receipt(
        &self,
        id: &CertificateId,
        receipt: &AnchorReceipt,
    ) -> Result<Certificate, RegistryError> {
        let _guard = self.write_lock.lock();
        let mut certificate = self.load(id)?;
        certificate.anchor = Some(receipt.clone());
        self.store.put(certificate.clone())?;
        Ok(certificate)
    }

    /// Anchor and persist the receipt.
    ///
    /// If the ledger already holds the same hash for this certificate (an
    /// earlier attempt landed but the receipt was not stored), that record
    /// is adopted.
    async fn anchor_certificate(
        &self,
        ledger: &Arc<dyn LedgerAnchor>,
        certificate: &Certificate,
    ) -> Result<Certificate, RegistryError> {
        let id = &certificate.certificate_id;
        let receipt = match ledger.anchor(id.as_str(), certificate.content_hash).await {
            Ok(receipt) => receipt,
            Err(AnchorError::AlreadyAnchored { .. }) => {
                match ledger.lookup(id.as_str()).await? {
                    Some(record) if record.content_hash == certificate.content_hash => {
                        record.receipt
                    }
                    _ => return Err(RegistryError::AlreadyAnchored(id.clone())),
                }
            }
            Err(e) => return Err(e.into()),
        };

        let updated = self.store_receipt(id, &receipt)?;
        log_certificate_event!(
            info,
            SUBSYSTEM,
            "Certificate anchored",
            id,
            network = %receipt.network,
            block_height = receipt.block_height,
            transaction_id = %receipt.transaction_id
        );
        Ok(updated)
    }

    /// A certificate that carries a receipt the ledger cannot find counts as
    /// a mismatch.
    async fn check_anchor(&self, certificate: &Certificate) -> AnchorCheck {
        match &self.anchor {
            Some(ledger) => {
                let check = confirm(
                    ledger.as_ref(),
                    certificate.certificate_id.as_str(),
                    &content_hash(certificate),
                )
                .await;
                match check {
                    AnchorCheck::NotAnchored if certificate.anchor.is_some() => {
                        AnchorCheck::Mismatch
                    }
                    other => other,
                }
            }
            None => AnchorCheck::NotAnchored,
        }
    }

    /// Judge, log and count one verification request.
    async fn verify_resolved(
        &self,
        subject: String,
        found: Option<Certificate>,
        ctx: &RequestContext,
    ) -> Result<VerificationResult, RegistryError> {
        let now = self.clock.now();

        let (outcome, anchor_check) = match &found {
            None => (VerificationOutcome::NotFound, AnchorCheck::NotAnchored),
            Some(certificate) => {
                let anchor_check = self.check_anchor(certificate).await;
                let outcome = if !verify_integrity(certificate) {
                    VerificationOutcome::Tampered
                } else if !certificate.is_active() {
                    VerificationOutcome::Revoked
                } else if certificate.is_expired(now) {
                    VerificationOutcome::Expired
                } else if anchor_check == AnchorCheck::Mismatch {
                    VerificationOutcome::AnchorMismatch
                } else {
                    VerificationOutcome::Valid
                };
                (outcome, anchor_check)
            }
        };

        let entry = self.log.record(VerificationAttempt {
            subject: subject.clone(),
            outcome,
            client_ip: ctx.client_ip,
            user_agent: ctx.user_agent.clone(),
            verifier: ctx.verifier.clone(),
        })?;

        VERIFICATIONS.with_label_values(&[outcome.as_str()]).inc();
        if entry.suspicious {
            SUSPICIOUS_VERIFICATIONS.inc();
        }

        if let Some(certificate) = &found {
            let _guard = self.write_lock.lock();
            self.store
                .record_verification(&certificate.certificate_id, now)?;
        }

        debug!(
            subsystem = SUBSYSTEM,
            subject = %subject,
            outcome = %outcome,
            anchor_check = anchor_check.as_str(),
            sequence = entry.sequence,
            "Verification answered"
        );

        let certificate = found
            .filter(|_| outcome != VerificationOutcome::Tampered)
            .map(|c| c.view());

        Ok(VerificationResult {
            subject,
            outcome,
            valid: outcome.is_valid(),
            anchor_check,
            certificate,
            suspicion: cc_03_verification_log::SuspicionAssessment {
                score: entry.suspicion_score,
                flags: entry.flags,
                suspicious: entry.suspicious,
            },
            log_sequence: entry.sequence,
            verified_at: now,
        })
    }
}

fn validate_learner_name(raw: &str) -> Result<String, RegistryError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RegistryError::InvalidRequest(
            "learner_name must not be empty".into(),
        ));
    }
    if name.chars().count() > MAX_LEARNER_NAME_LEN {
        return Err(RegistryError::InvalidRequest(format!(
            "learner_name exceeds {MAX_LEARNER_NAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(RegistryError::InvalidRequest(
            "learner_name contains control characters".into(),
        ));
    }
    Ok(name.to_string())
}

#[async_trait]
impl CertificateRegistryApi for CertificateService {
    async fn issue(&self, request: IssueRequest) -> Result<Certificate, RegistryError> {
        let learner_name = validate_learner_name(&request.learner_name)?;
        let report = self
            .eligibility
            .evaluate(&request.outline, &request.progress)?;

        if !report.eligible {
            debug!(
                subsystem = SUBSYSTEM,
                learner_id = %report.learner_id,
                course_id = %report.course_id,
                score = report.final_score,
                gaps = report.gaps.len(),
                "Issuance refused: not eligible"
            );
            return Err(RegistryError::NotEligible { gaps: report.gaps });
        }

        let certificate = {
            let _guard = self.write_lock.lock();
            if let Some(existing) = self
                .store
                .find_active(&report.learner_id, &report.course_id)?
            {
                return Err(RegistryError::AlreadyIssued {
                    certificate_id: existing.certificate_id,
                });
            }

            let issued_at = self.clock.now();
            let mut certificate = Certificate {
                certificate_id: self.fresh_id(issued_at)?,
                learner_id: report.learner_id.clone(),
                learner_name,
                course_id: report.course_id.clone(),
                course_title: request.outline.title.clone(),
                final_score: report.final_score,
                grade: report.grade,
                completed_at: report.completed_at.unwrap_or(issued_at),
                issued_at,
                issuer: self.config.issuer.clone(),
                content_hash: ZERO_HASH,
                status: CertificateStatus::Active,
                revocation: None,
                anchor: None,
                verification_count: 0,
                last_verified_at: None,
                display_name_override: None,
                metadata: Default::default(),
                expires_at: self
                    .config
                    .validity_days
                    .map(|days| issued_at + u64::from(days) * SECS_PER_DAY),
            };
            certificate.content_hash = content_hash(&certificate);
            self.store.put(certificate.clone())?;
            certificate
        };

        CERTIFICATES_ISSUED.inc();
        log_certificate_event!(
            info,
            SUBSYSTEM,
            "Certificate issued",
            certificate.certificate_id,
            learner_id = %certificate.learner_id,
            course_id = %certificate.course_id,
            score = certificate.final_score,
            grade = %certificate.grade,
            content_hash = %hash_to_hex(&certificate.content_hash)
        );

        if self.config.anchor_on_issue {
            if let Some(ledger) = &self.anchor {
                match self.anchor_certificate(ledger, &certificate).await {
                    Ok(anchored) => return Ok(anchored),
                    Err(e) => {
                        ANCHOR_FAILURES.inc();
                        warn!(
                            subsystem = SUBSYSTEM,
                            certificate_id = %certificate.certificate_id,
                            error = %e,
                            "Anchoring at issuance failed; certificate left unanchored"
                        );
                    }
                }
            }
        }

        Ok(certificate)
    }

    fn check_eligibility(
        &self,
        outline: &CourseOutline,
        progress: &LearnerProgress,
    ) -> Result<EligibilityReport, RegistryError> {
        Ok(self.eligibility.evaluate(outline, progress)?)
    }

    fn get(&self, id: &CertificateId) -> Result<Certificate, RegistryError> {
        self.load(id)
    }

    fn list_by_learner(&self, learner_id: &LearnerId) -> Result<Vec<Certificate>, RegistryError> {
        Ok(self.store.list_by_learner(learner_id)?)
    }

    fn list_by_course(&self, course_id: &CourseId) -> Result<Vec<Certificate>, RegistryError> {
        Ok(self.store.list_by_course(course_id)?)
    }

    fn find_by_hash(&self, hash_hex: &str) -> Result<Certificate, RegistryError> {
        let hash = hash_from_hex(hash_hex)
            .map_err(|e| RegistryError::InvalidRequest(format!("content hash: {e}")))?;
        self.store
            .find_by_hash(&hash)?
            .ok_or_else(|| RegistryError::NotFound(hash_to_hex(&hash)))
    }

    async fn anchor(&self, id: &CertificateId) -> Result<AnchorReceipt, RegistryError> {
        let ledger = self
            .anchor
            .as_ref()
            .ok_or_else(|| AnchorError::Unavailable("no ledger configured".into()))?;

        let certificate = self.load(id)?;
        if certificate.anchor.is_some() {
            return Err(RegistryError::AlreadyAnchored(id.clone()));
        }
        if !certificate.is_active() {
            return Err(RegistryError::CertificateRevoked(id.clone()));
        }
        if !verify_integrity(&certificate) {
            return Err(RegistryError::InvalidRequest(format!(
                "certificate {id} fails its integrity check"
            )));
        }

        match self.anchor_certificate(ledger, &certificate).await {
            Ok(anchored) => anchored
                .anchor
                .ok_or_else(|| RegistryError::NotFound(id.to_string())),
            Err(e) => {
                if matches!(e, RegistryError::Anchor(_)) {
                    ANCHOR_FAILURES.inc();
                }
                Err(e)
            }
        }
    }

    async fn verify(
        &self,
        id: &str,
        ctx: &RequestContext,
    ) -> Result<VerificationResult, RegistryError> {
        let found = match CertificateId::parse(id) {
            Ok(id) => self.store.get(&id)?,
            Err(_) => None,
        };
        self.verify_resolved(id.to_string(), found, ctx).await
    }

    async fn verify_by_hash(
        &self,
        hash_hex: &str,
        ctx: &RequestContext,
    ) -> Result<VerificationResult, RegistryError> {
        let hash = hash_from_hex(hash_hex)
            .map_err(|e| RegistryError::InvalidRequest(format!("content hash: {e}")))?;
        let found = self.store.find_by_hash(&hash)?;
        let subject = match &found {
            Some(c) => c.certificate_id.to_string(),
            None => hash_to_hex(&hash),
        };
        self.verify_resolved(subject, found, ctx).await
    }

    fn revoke(
        &self,
        id: &CertificateId,
        reason: &str,
        revoked_by: &str,
    ) -> Result<Certificate, RegistryError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(RegistryError::InvalidRequest(
                "revocation reason must not be empty".into(),
            ));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(RegistryError::InvalidRequest(format!(
                "revocation reason exceeds {MAX_REASON_LEN} characters"
            )));
        }
        let revoked_by = revoked_by.trim();
        if revoked_by.is_empty() {
            return Err(RegistryError::InvalidRequest(
                "revoked_by must not be empty".into(),
            ));
        }

        let certificate = {
            let _guard = self.write_lock.lock();
            let mut certificate = self.load(id)?;
            if certificate.status == CertificateStatus::Revoked {
                return Err(RegistryError::AlreadyRevoked(id.clone()));
            }
            certificate.status = CertificateStatus::Revoked;
            certificate.revocation = Some(Revocation {
                reason: reason.to_string(),
                revoked_by: revoked_by.to_string(),
                revoked_at: self.clock.now(),
            });
            self.store.put(certificate.clone())?;
            certificate
        };

        CERTIFICATES_REVOKED.inc();
        log_certificate_event!(
            warn,
            SUBSYSTEM,
            "Certificate revoked",
            certificate.certificate_id,
            learner_id = %certificate.learner_id,
            revoked_by = %revoked_by,
            reason = %reason
        );
        Ok(certificate)
    }

    fn update(
        &self,
        id: &CertificateId,
        patch: &CertificatePatch,
    ) -> Result<Certificate, RegistryError> {
        let _guard = self.write_lock.lock();
        let mut certificate = self.load(id)?;
        if apply_patch(&mut certificate, patch)? {
            self.store.put(certificate.clone())?;
            log_certificate_event!(info, SUBSYSTEM, "Certificate updated", id);
        }
        Ok(certificate)
    }

    fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let now = self.clock.now();
        let mut stats = RegistryStats::default();
        for certificate in self.store.all()? {
            stats.total += 1;
            match certificate.status {
                CertificateStatus::Active => stats.active += 1,
                CertificateStatus::Revoked => stats.revoked += 1,
            }
            if certificate.anchor.is_some() {
                stats.anchored += 1;
            }
            if certificate.is_active() && certificate.is_expired(now) {
                stats.expired += 1;
            }
        }
        Ok(stats)
    }
}
