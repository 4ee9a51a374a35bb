//! # Ports Layer
//!
//! - `inbound.rs` - Driving port used by the API gateway
//! - `outbound.rs` - Driven port for certificate persistence

pub mod inbound;
pub mod outbound;

pub use inbound::CertificateRegistryApi;
pub use outbound::CertificateStore;
