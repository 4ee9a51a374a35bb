//! # Adapters Module
//!
//! - `memory`: `InMemoryCertificateStore` for tests and ephemeral nodes
//! - `file`: `FileCertificateStore`, JSON snapshot replaced atomically on write

pub mod file;
pub mod memory;

pub use file::FileCertificateStore;
pub use memory::InMemoryCertificateStore;
