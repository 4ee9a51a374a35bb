//! # Suspicion Scoring
//!
//! Threshold heuristics over the retained window of recent entries. The
//! window is scanned newest-first and the scan stops at the longest
//! configured look-back.

use std::collections::{HashSet, VecDeque};
use std::net::IpAddr;

use shared_types::Timestamp;

use super::entities::{
    SuspicionAssessment, SuspicionFlag, VerificationAttempt, VerificationEntry,
    VerificationOutcome,
};
use super::policy::FraudPolicy;

/// Upper bound of a suspicion score.
pub const MAX_SCORE: u8 = 100;

/// Score an attempt against previously recorded entries.
pub fn assess(
    policy: &FraudPolicy,
    attempt: &VerificationAttempt,
    now: Timestamp,
    history: &VecDeque<VerificationEntry>,
) -> SuspicionAssessment {
    let mut flags = Vec::new();

    if let Some(ip) = attempt.client_ip {
        let counts = scan(policy, attempt, ip, now, history);

        if counts.same_ip_recent + 1 >= policy.rapid_repeat_threshold {
            flags.push(SuspicionFlag::RapidRepeat);
        }

        let current_not_found = usize::from(attempt.outcome == VerificationOutcome::NotFound);
        if counts.same_ip_not_found + current_not_found >= policy.enumeration_threshold {
            flags.push(SuspicionFlag::Enumeration);
        }

        if counts.subject_ips.len() >= policy.distinct_ip_threshold {
            flags.push(SuspicionFlag::DistributedProbing);
        }
    }

    match attempt.outcome {
        VerificationOutcome::Tampered | VerificationOutcome::AnchorMismatch => {
            flags.push(SuspicionFlag::TamperedPresented);
        }
        VerificationOutcome::Revoked => flags.push(SuspicionFlag::RevokedPresented),
        _ => {}
    }

    if attempt.user_agent.is_none() {
        flags.push(SuspicionFlag::MissingUserAgent);
    }

    let total: u32 = flags.iter().map(|f| u32::from(f.weight())).sum();
    let score = total.min(u32::from(MAX_SCORE)) as u8;

    SuspicionAssessment {
        score,
        suspicious: score >= policy.suspicious_threshold,
        flags,
    }
}

struct WindowCounts {
    same_ip_recent: usize,
    same_ip_not_found: usize,
    /// Includes the current attempt's IP.
    subject_ips: HashSet<IpAddr>,
}

fn scan(
    policy: &FraudPolicy,
    attempt: &VerificationAttempt,
    ip: IpAddr,
    now: Timestamp,
    history: &VecDeque<VerificationEntry>,
) -> WindowCounts {
    let rapid_since = now.saturating_sub(policy.rapid_repeat_window.as_secs());
    let enum_since = now.saturating_sub(policy.enumeration_window.as_secs());
    let distinct_since = now.saturating_sub(policy.distinct_ip_window.as_secs());
    let horizon = now.saturating_sub(policy.max_window().as_secs());

    let mut counts = WindowCounts {
        same_ip_recent: 0,
        same_ip_not_found: 0,
        subject_ips: HashSet::from([ip]),
    };

    for entry in history.iter().rev() {
        if entry.verified_at < horizon {
            break;
        }

        if entry.client_ip == Some(ip) {
            if entry.verified_at >= rapid_since {
                counts.same_ip_recent += 1;
            }
            if entry.verified_at >= enum_since && entry.outcome == VerificationOutcome::NotFound {
                counts.same_ip_not_found += 1;
            }
        }

        if entry.verified_at >= distinct_since && entry.subject == attempt.subject {
            if let Some(other) = entry.client_ip {
                counts.subject_ips.insert(other);
            }
        }
    }

    counts
}
