//! # Ports Layer
//!
//! - `outbound.rs` - Driven ports (durable storage for audit entries)

pub mod outbound;

pub use outbound::AuditSink;
