//! # Domain Entities
//!
//! Certificates, their public view and the results of registry operations.

use std::collections::BTreeMap;

use cc_01_eligibility::{CourseOutline, Grade, LearnerProgress};
use cc_03_verification_log::{SuspicionAssessment, VerificationOutcome};
use cc_04_ledger_anchor::{AnchorCheck, AnchorReceipt};
use serde::{Deserialize, Serialize};
use shared_types::{hash_to_hex, CertificateId, CourseId, Hash, LearnerId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Active,
    /// Terminal.
    Revoked,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub reason: String,
    pub revoked_by: String,
    pub revoked_at: Timestamp,
}

/// An issued certificate as stored by the registry.
///
/// Fields from `certificate_id` through `issuer` are covered by
/// `content_hash` and never change after issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: CertificateId,
    pub learner_id: LearnerId,
    pub learner_name: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub final_score: f64,
    pub grade: Grade,
    pub completed_at: Timestamp,
    pub issued_at: Timestamp,
    pub issuer: String,

    #[serde(with = "shared_types::hex_hash")]
    pub content_hash: Hash,
    pub status: CertificateStatus,
    #[serde(default)]
    pub revocation: Option<Revocation>,
    #[serde(default)]
    pub anchor: Option<AnchorReceipt>,
    #[serde(default)]
    pub verification_count: u64,
    #[serde(default)]
    pub last_verified_at: Option<Timestamp>,
    #[serde(default)]
    pub display_name_override: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

impl Certificate {
    pub fn is_active(&self) -> bool {
        self.status == CertificateStatus::Active
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Name to print: the override if set, otherwise the hashed name.
    pub fn display_name(&self) -> &str {
        self.display_name_override
            .as_deref()
            .unwrap_or(&self.learner_name)
    }

    pub fn view(&self) -> CertificateView {
        CertificateView::from(self)
    }
}

/// What a verifier sees. Omits metadata and verification counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateView {
    pub certificate_id: CertificateId,
    pub learner_id: LearnerId,
    pub learner_name: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub final_score: f64,
    pub grade: Grade,
    pub completed_at: Timestamp,
    pub issued_at: Timestamp,
    pub issuer: String,
    pub content_hash: String,
    pub status: CertificateStatus,
    pub expires_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
    pub revocation_reason: Option<String>,
    pub anchor: Option<AnchorReceipt>,
}

impl From<&Certificate> for CertificateView {
    fn from(c: &Certificate) -> Self {
        Self {
            certificate_id: c.certificate_id.clone(),
            learner_id: c.learner_id.clone(),
            learner_name: c.display_name().to_string(),
            course_id: c.course_id.clone(),
            course_title: c.course_title.clone(),
            final_score: c.final_score,
            grade: c.grade,
            completed_at: c.completed_at,
            issued_at: c.issued_at,
            issuer: c.issuer.clone(),
            content_hash: hash_to_hex(&c.content_hash),
            status: c.status,
            expires_at: c.expires_at,
            revoked_at: c.revocation.as_ref().map(|r| r.revoked_at),
            revocation_reason: c.revocation.as_ref().map(|r| r.reason.clone()),
            anchor: c.anchor.clone(),
        }
    }
}

/// Input to `issue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub learner_name: String,
    pub outline: CourseOutline,
    pub progress: LearnerProgress,
}

/// Requested changes to a certificate.
///
/// Any field may be present, but only `display_name_override` and
/// `metadata` may differ from the stored value. An empty override clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CertificatePatch {
    pub certificate_id: Option<CertificateId>,
    pub learner_id: Option<LearnerId>,
    pub learner_name: Option<String>,
    pub course_id: Option<CourseId>,
    pub course_title: Option<String>,
    pub final_score: Option<f64>,
    pub grade: Option<Grade>,
    pub completed_at: Option<Timestamp>,
    pub issued_at: Option<Timestamp>,
    pub issuer: Option<String>,
    pub content_hash: Option<String>,
    pub status: Option<CertificateStatus>,
    pub expires_at: Option<Timestamp>,

    pub display_name_override: Option<String>,
    /// Replaces all metadata.
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Answer to a verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Certificate id or hash the caller presented.
    pub subject: String,
    pub outcome: VerificationOutcome,
    pub valid: bool,
    pub anchor_check: AnchorCheck,
    pub certificate: Option<CertificateView>,
    pub suspicion: SuspicionAssessment,
    /// Sequence of the audit entry written for this request.
    pub log_sequence: u64,
    pub verified_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total: u64,
    pub active: u64,
    pub revoked: u64,
    pub anchored: u64,
    pub expired: u64,
}
