//! Cross-subsystem integration flows.

mod certificate_flows;
mod http_flows;
mod persistence;
