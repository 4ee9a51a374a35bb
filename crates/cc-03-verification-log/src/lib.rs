//! # Verification Log Subsystem (cc-03)
//!
//! Append-only audit trail of every certificate verification attempt, with
//! heuristic suspicion scoring.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | INVARIANT-1 | Append-only | `record` is the only mutation |
//! | INVARIANT-2 | Monotonic sequence | `sequence` starts at 1, +1 per entry |
//! | INVARIANT-3 | Hash chain | `entry_hash = H(prev_hash ‖ fields)`, first `prev_hash` = 0 |
//! | INVARIANT-4 | Bounded memory | Oldest entries leave the window past `max_entries` |
//! | INVARIANT-5 | Durable before visible | Sink write precedes in-memory commit |
//!
//! ## Suspicion Heuristics
//!
//! | Flag | Trigger | Weight |
//! |------|---------|--------|
//! | `RapidRepeat` | one IP hammering verifications | 30 |
//! | `Enumeration` | one IP collecting not-found results | 40 |
//! | `TamperedPresented` | tampered or ledger-mismatched certificate | 50 |
//! | `RevokedPresented` | revoked certificate | 20 |
//! | `DistributedProbing` | one certificate checked from many IPs | 15 |
//! | `MissingUserAgent` | no `User-Agent` | 10 |
//!
//! Scores are capped at 100.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{JsonLinesSink, NullSink};
pub use domain::{
    assess, ChainReport, FraudPolicy, LogError, LogStats, SuspicionAssessment, SuspicionFlag,
    VerificationAttempt, VerificationEntry, VerificationOutcome, MAX_SUBJECT_LEN,
};
pub use ports::AuditSink;
pub use service::VerificationLog;
