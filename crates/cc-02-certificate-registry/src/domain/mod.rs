//! # Domain Layer
//!
//! Certificates, the content-hash integrity rules, id generation and
//! registry configuration.

pub mod entities;
pub mod errors;
pub mod id;
pub mod integrity;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use id::new_certificate_id;
pub use integrity::{apply_patch, canonical_content, content_hash, verify_integrity};
pub use value_objects::RegistryConfig;
