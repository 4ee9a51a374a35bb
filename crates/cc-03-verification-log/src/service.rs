//! # Verification Log Service
//!
//! Seals attempts into hash-chained entries, scores them, writes them to the
//! sink and keeps a bounded window in memory for queries and heuristics.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{truncate, Hash, TimeSource, ZERO_HASH};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::NullSink;
use crate::domain::chain::{entry_follows, verify_entries};
use crate::domain::{
    assess, compute_entry_hash, ChainReport, FraudPolicy, LogError, LogStats, VerificationAttempt,
    VerificationEntry, MAX_SUBJECT_LEN,
};
use crate::ports::AuditSink;

struct LogState {
    entries: VecDeque<VerificationEntry>,
    next_sequence: u64,
    head: Hash,
    stats: LogStats,
}

impl LogState {
    fn empty() -> Self {
        Self {
            entries: VecDeque::new(),
            next_sequence: 1,
            head: ZERO_HASH,
            stats: LogStats::default(),
        }
    }
}

pub struct VerificationLog {
    policy: FraudPolicy,
    sink: Arc<dyn AuditSink>,
    clock: Arc<dyn TimeSource>,
    state: RwLock<LogState>,
}

impl VerificationLog {
    /// In-memory log with no durable sink.
    pub fn new(policy: FraudPolicy, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            policy,
            sink: Arc::new(NullSink),
            clock,
            state: RwLock::new(LogState::empty()),
        }
    }

    /// Log backed by `sink`, restoring everything it already holds.
    ///
    /// Entries are streamed and checked link by link; only the newest
    /// `max_entries` stay in memory. Fails if the stored entries do not form
    /// an unbroken chain from sequence 1.
    pub fn with_sink(
        policy: FraudPolicy,
        sink: Arc<dyn AuditSink>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, LogError> {
        let keep = policy.max_entries.max(1);
        let mut state = LogState::empty();

        sink.replay(&mut |entry| {
            let prev = state.entries.back();
            if (prev.is_none() && entry.sequence != 1) || !entry_follows(prev, &entry) {
                return Err(LogError::ChainBroken {
                    sequence: entry.sequence,
                });
            }

            state.stats.record(entry.outcome, entry.suspicious);
            state.next_sequence = entry.sequence + 1;
            state.head = entry.entry_hash;
            state.entries.push_back(entry);
            if state.entries.len() > keep {
                state.entries.pop_front();
            }
            Ok(())
        })?;

        info!(
            restored = state.stats.total,
            retained = state.entries.len(),
            "Verification log restored"
        );

        Ok(Self {
            policy,
            sink,
            clock,
            state: RwLock::new(state),
        })
    }

    pub fn policy(&self) -> &FraudPolicy {
        &self.policy
    }

    /// Score, seal and persist one attempt.
    ///
    /// The entry is visible to queries only once the sink accepted it.
    pub fn record(&self, mut attempt: VerificationAttempt) -> Result<VerificationEntry, LogError> {
        if attempt.subject.len() > MAX_SUBJECT_LEN {
            attempt.subject = truncate(&attempt.subject, MAX_SUBJECT_LEN);
        }

        let mut state = self.state.write();
        let now = self.clock.now();
        let assessment = assess(&self.policy, &attempt, now, &state.entries);

        let mut entry = VerificationEntry {
            sequence: state.next_sequence,
            entry_id: Uuid::new_v4().to_string(),
            subject: attempt.subject,
            outcome: attempt.outcome,
            client_ip: attempt.client_ip,
            user_agent: attempt.user_agent,
            verifier: attempt.verifier,
            verified_at: now,
            suspicion_score: assessment.score,
            flags: assessment.flags,
            suspicious: assessment.suspicious,
            prev_hash: state.head,
            entry_hash: ZERO_HASH,
        };
        entry.entry_hash = compute_entry_hash(&entry);

        self.sink.append(&entry)?;

        state.next_sequence += 1;
        state.head = entry.entry_hash;
        state.stats.record(entry.outcome, entry.suspicious);
        state.entries.push_back(entry.clone());
        while state.entries.len() > self.policy.max_entries.max(1) {
            state.entries.pop_front();
        }
        drop(state);

        if entry.suspicious {
            warn!(
                sequence = entry.sequence,
                subject = %entry.subject,
                outcome = %entry.outcome,
                client_ip = ?entry.client_ip,
                score = entry.suspicion_score,
                flags = ?entry.flags,
                "Suspicious verification attempt"
            );
        } else {
            debug!(
                sequence = entry.sequence,
                subject = %entry.subject,
                outcome = %entry.outcome,
                score = entry.suspicion_score,
                "Verification recorded"
            );
        }

        Ok(entry)
    }

    /// Retained entries for one subject, newest first.
    pub fn entries_for(&self, subject: &str, limit: usize) -> Vec<VerificationEntry> {
        self.state
            .read()
            .entries
            .iter()
            .rev()
            .filter(|e| e.subject == subject)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Newest entries first.
    pub fn recent(&self, limit: usize) -> Vec<VerificationEntry> {
        self.state
            .read()
            .entries
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Newest suspicious entries first.
    pub fn suspicious(&self, limit: usize) -> Vec<VerificationEntry> {
        self.state
            .read()
            .entries
            .iter()
            .rev()
            .filter(|e| e.suspicious)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> LogStats {
        let state = self.state.read();
        LogStats {
            retained: state.entries.len(),
            ..state.stats.clone()
        }
    }

    /// Re-verify the retained window.
    pub fn verify_chain(&self) -> ChainReport {
        verify_entries(&self.state.read().entries)
    }

    /// Hash of the most recent entry, zero before the first.
    pub fn head(&self) -> Hash {
        self.state.read().head
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}
