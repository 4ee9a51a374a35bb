//! # Entry Hash Chain
//!
//! Each entry commits to its predecessor's hash. Fields are length-prefixed
//! (u32 big-endian) so no two distinct entries share an encoding.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{Hash, ZERO_HASH};

use super::entities::VerificationEntry;

/// Hash of an entry's content and its link to `prev_hash`.
///
/// `entry.entry_hash` is not an input.
pub fn compute_entry_hash(entry: &VerificationEntry) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(entry.prev_hash);
    hasher.update(entry.sequence.to_be_bytes());

    let ip = entry.client_ip.map(|ip| ip.to_string()).unwrap_or_default();
    let flags = entry
        .flags
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(",");

    for field in [
        entry.entry_id.as_str(),
        entry.subject.as_str(),
        entry.outcome.as_str(),
        ip.as_str(),
        entry.user_agent.as_deref().unwrap_or(""),
        entry.verifier.as_deref().unwrap_or(""),
        flags.as_str(),
    ] {
        update_field(&mut hasher, field.as_bytes());
    }

    hasher.update(entry.verified_at.to_be_bytes());
    hasher.update([entry.suspicion_score, u8::from(entry.suspicious)]);
    hasher.finalize().into()
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u32).to_be_bytes());
    hasher.update(bytes);
}

/// Outcome of walking a sequence of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub intact: bool,
    pub checked: usize,
    /// Sequence of the first entry that fails to verify.
    pub first_broken: Option<u64>,
}

/// Whether `entry` is correctly sealed and directly follows `prev`.
///
/// With no predecessor an entry at sequence 1 must link to the zero hash;
/// a later one is trusted at its first link.
pub fn entry_follows(prev: Option<&VerificationEntry>, entry: &VerificationEntry) -> bool {
    let linked = match prev {
        Some(p) => entry.prev_hash == p.entry_hash && entry.sequence == p.sequence + 1,
        None => entry.sequence > 1 || (entry.sequence == 1 && entry.prev_hash == ZERO_HASH),
    };
    linked && compute_entry_hash(entry) == entry.entry_hash
}

/// Verify hashes, links and sequence numbers of consecutive entries.
pub fn verify_entries<'a, I>(entries: I) -> ChainReport
where
    I: IntoIterator<Item = &'a VerificationEntry>,
{
    let mut checked = 0;
    let mut prev: Option<&VerificationEntry> = None;

    for entry in entries {
        if !entry_follows(prev, entry) {
            return ChainReport {
                intact: false,
                checked,
                first_broken: Some(entry.sequence),
            };
        }

        checked += 1;
        prev = Some(entry);
    }

    ChainReport {
        intact: true,
        checked,
        first_broken: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::VerificationOutcome;

    fn sealed(sequence: u64, prev_hash: Hash) -> VerificationEntry {
        let mut entry = VerificationEntry {
            sequence,
            entry_id: format!("entry-{sequence}"),
            subject: "CERT-20240101-ABCDEF01".into(),
            outcome: VerificationOutcome::Valid,
            client_ip: None,
            user_agent: Some("curl/8".into()),
            verifier: None,
            verified_at: 1_700_000_000 + sequence,
            suspicion_score: 0,
            flags: Vec::new(),
            suspicious: false,
            prev_hash,
            entry_hash: ZERO_HASH,
        };
        entry.entry_hash = compute_entry_hash(&entry);
        entry
    }

    fn chain(n: u64) -> Vec<VerificationEntry> {
        let mut out: Vec<VerificationEntry> = Vec::new();
        for seq in 1..=n {
            let prev = out.last().map(|e| e.entry_hash).unwrap_or(ZERO_HASH);
            out.push(sealed(seq, prev));
        }
        out
    }

    #[test]
    fn test_intact_chain() {
        let entries = chain(5);
        let report = verify_entries(&entries);
        assert!(report.intact);
        assert_eq!(report.checked, 5);
    }

    #[test]
    fn test_empty_chain_is_intact() {
        let report = verify_entries(&Vec::new());
        assert!(report.intact);
        assert_eq!(report.checked, 0);
    }

    #[test]
    fn test_edited_entry_detected() {
        let mut entries = chain(4);
        entries[2].outcome = VerificationOutcome::NotFound;
        let report = verify_entries(&entries);
        assert!(!report.intact);
        assert_eq!(report.first_broken, Some(3));
        assert_eq!(report.checked, 2);
    }

    #[test]
    fn test_removed_entry_detected() {
        let mut entries = chain(4);
        entries.remove(1);
        let report = verify_entries(&entries);
        assert_eq!(report.first_broken, Some(3));
    }

    #[test]
    fn test_window_may_start_mid_chain() {
        let entries = chain(6);
        assert!(verify_entries(&entries[3..]).intact);
    }

    #[test]
    fn test_genesis_must_link_to_zero() {
        let forged = sealed(1, [7u8; 32]);
        assert!(!verify_entries([&forged]).intact);
    }

    #[test]
    fn test_field_boundaries_matter() {
        let mut a = sealed(1, ZERO_HASH);
        let mut b = a.clone();
        a.user_agent = Some("ab".into());
        a.verifier = Some("c".into());
        b.user_agent = Some("a".into());
        b.verifier = Some("bc".into());
        assert_ne!(compute_entry_hash(&a), compute_entry_hash(&b));
    }
}
