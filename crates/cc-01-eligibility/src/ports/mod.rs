//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: APIs consumed by the registry and the gateway

pub mod inbound;

pub use inbound::*;
