//! # Domain Entities
//!
//! Verification outcomes, suspicion flags and audit entries.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, Timestamp};
use std::fmt;
use std::net::IpAddr;

/// Result of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Certificate exists, hash intact, active, not expired, ledger agrees.
    Valid,
    /// Certificate was revoked by the issuer.
    Revoked,
    /// Certificate passed its expiry date.
    Expired,
    /// Stored fields no longer match the content hash.
    Tampered,
    /// No certificate with this id or hash.
    NotFound,
    /// Ledger holds a different hash for this certificate.
    AnchorMismatch,
}

impl VerificationOutcome {
    pub const ALL: [VerificationOutcome; 6] = [
        VerificationOutcome::Valid,
        VerificationOutcome::Revoked,
        VerificationOutcome::Expired,
        VerificationOutcome::Tampered,
        VerificationOutcome::NotFound,
        VerificationOutcome::AnchorMismatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Tampered => "tampered",
            Self::NotFound => "not_found",
            Self::AnchorMismatch => "anchor_mismatch",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A heuristic that fired for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionFlag {
    RapidRepeat,
    Enumeration,
    TamperedPresented,
    RevokedPresented,
    DistributedProbing,
    MissingUserAgent,
}

impl SuspicionFlag {
    /// Contribution of this flag to the suspicion score.
    pub fn weight(&self) -> u8 {
        match self {
            Self::RapidRepeat => 30,
            Self::Enumeration => 40,
            Self::TamperedPresented => 50,
            Self::RevokedPresented => 20,
            Self::DistributedProbing => 15,
            Self::MissingUserAgent => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RapidRepeat => "rapid_repeat",
            Self::Enumeration => "enumeration",
            Self::TamperedPresented => "tampered_presented",
            Self::RevokedPresented => "revoked_presented",
            Self::DistributedProbing => "distributed_probing",
            Self::MissingUserAgent => "missing_user_agent",
        }
    }
}

/// Score and flags for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuspicionAssessment {
    /// 0..=100.
    pub score: u8,
    pub flags: Vec<SuspicionFlag>,
    pub suspicious: bool,
}

/// Longest subject stored in an entry, in bytes. Longer subjects are cut.
pub const MAX_SUBJECT_LEN: usize = shared_types::MAX_ID_LEN;

/// What the registry reports to the log for one verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationAttempt {
    /// Certificate id or hex hash the verifier asked about.
    pub subject: String,
    pub outcome: VerificationOutcome,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub verifier: Option<String>,
}

/// One sealed audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub sequence: u64,
    pub entry_id: String,
    pub subject: String,
    pub outcome: VerificationOutcome,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub verifier: Option<String>,
    pub verified_at: Timestamp,
    pub suspicion_score: u8,
    pub flags: Vec<SuspicionFlag>,
    pub suspicious: bool,
    #[serde(with = "shared_types::hex_hash")]
    pub prev_hash: Hash,
    #[serde(with = "shared_types::hex_hash")]
    pub entry_hash: Hash,
}

/// All-time counters, unaffected by window eviction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    pub total: u64,
    pub valid: u64,
    pub revoked: u64,
    pub expired: u64,
    pub tampered: u64,
    pub not_found: u64,
    pub anchor_mismatch: u64,
    pub suspicious: u64,
    /// Entries currently held in memory.
    pub retained: usize,
}

impl LogStats {
    pub fn record(&mut self, outcome: VerificationOutcome, suspicious: bool) {
        self.total += 1;
        match outcome {
            VerificationOutcome::Valid => self.valid += 1,
            VerificationOutcome::Revoked => self.revoked += 1,
            VerificationOutcome::Expired => self.expired += 1,
            VerificationOutcome::Tampered => self.tampered += 1,
            VerificationOutcome::NotFound => self.not_found += 1,
            VerificationOutcome::AnchorMismatch => self.anchor_mismatch += 1,
        }
        if suspicious {
            self.suspicious += 1;
        }
    }
}
