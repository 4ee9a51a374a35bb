//! # Adapters Module
//!
//! - `memory`: `NullSink`, keeps nothing beyond the in-memory window
//! - `jsonl`: `JsonLinesSink`, one JSON entry per line, append-only file

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonLinesSink;
pub use memory::NullSink;
