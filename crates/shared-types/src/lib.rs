//! # Shared Types Crate
//!
//! Identifiers, hashes, timestamps and the per-request context used by all
//! CertChain subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Validated Identifiers**: IDs are newtypes that can only be built through
//!   `parse`, including when deserialized from JSON.
//! - **Injectable Time**: Domain code never reads the system clock directly;
//!   it goes through a [`TimeSource`].

pub mod context;
pub mod entities;
pub mod errors;
pub mod time;

pub use context::{truncate, RequestContext};
pub use entities::*;
pub use errors::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource, Timestamp, SECS_PER_DAY};
