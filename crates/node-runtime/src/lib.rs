//! # Node Runtime Library
//!
//! Configuration loading and subsystem wiring for the `certchain-node`
//! binary, exposed as a library for integration tests.
//!
//! ## Architectural Patterns
//!
//! - **DDD (Domain-Driven Design)**: Each subsystem owns its domain logic
//! - **Hexagonal Architecture**: Ports define contracts, Adapters implement them
//! - **Pluggable Persistence**: In-memory by default, file-backed with `data_dir`

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod container;
pub mod runtime;

pub use container::{AnchorConfig, ConfigError, NodeConfig, NodeContainer, StorageConfig};
pub use runtime::{shutdown_signal, NodeRuntime};
