//! # CertChain Test Suite
//!
//! Unified test crate for flows that cross subsystem boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Course outlines, progress records, node builders
//! └── integration/      # Cross-subsystem flows
//!     ├── certificate_flows.rs   # issue → verify → revoke over the container
//!     ├── persistence.rs         # restart against a data directory
//!     └── http_flows.rs          # the same lifecycle through the router
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cc-tests
//!
//! # By category
//! cargo test -p cc-tests integration::persistence
//! ```

#![allow(dead_code)]

#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod integration;
