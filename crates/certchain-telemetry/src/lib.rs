//! # CertChain Telemetry
//!
//! Structured logging and Prometheus metrics shared by every CertChain crate.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use certchain_telemetry::{init_logging, register_metrics, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! register_metrics()?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CC_LOG_LEVEL` | `RUST_LOG`, then `info` | Log level filter |
//! | `CC_JSON_LOGS` | `false` (`true` in containers) | JSON formatted logs |
//! | `CC_SERVICE_NAME` | `certchain` | Service name in the startup line |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, ANCHOR_FAILURES, CERTIFICATES_ISSUED, CERTIFICATES_REVOKED,
    HTTP_REQUESTS, HTTP_REQUEST_DURATION, RATE_LIMITED_REQUESTS, SUSPICIOUS_VERIFICATIONS,
    VERIFICATIONS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Emit a tracing event tagged with the subsystem that produced it.
///
/// ```rust,ignore
/// log_event!(info, "registry", "Certificate issued", certificate_id = %id);
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:ident, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a certificate lifecycle event with standard fields.
#[macro_export]
macro_rules! log_certificate_event {
    ($level:ident, $subsystem:expr, $msg:expr, $certificate_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            certificate_id = %$certificate_id,
            $($($field)*,)?
            $msg
        )
    };
}
