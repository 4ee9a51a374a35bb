//! # Certificate Registry Subsystem (cc-02)
//!
//! Issues certificates to eligible learners, guards their integrity with a
//! content hash, and answers public verification requests.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | INVARIANT-1 | Only eligible learners get certificates | `issue` runs the eligibility evaluator |
//! | INVARIANT-2 | One active certificate per learner and course | `issue` checks `find_active` under the write lock |
//! | INVARIANT-3 | Immutable content | `apply_patch` rejects changes to hashed fields |
//! | INVARIANT-4 | Tamper evidence | `content_hash` recomputed on every verification |
//! | INVARIANT-5 | Revocation is terminal | No operation moves `Revoked` back to `Active` |
//! | INVARIANT-6 | Every verification is logged | `verify` records before answering |
//!
//! ## Verification Precedence
//!
//! `NotFound` → `Tampered` → `Revoked` → `Expired` → `AnchorMismatch` → `Valid`

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{FileCertificateStore, InMemoryCertificateStore};
pub use domain::{
    apply_patch, content_hash, new_certificate_id, verify_integrity, Certificate,
    CertificatePatch, CertificateStatus, CertificateView, IssueRequest, RegistryConfig,
    RegistryError, RegistryStats, Revocation, StoreError, VerificationResult,
};
pub use ports::{CertificateRegistryApi, CertificateStore};
pub use service::CertificateService;
