//! Prometheus metrics for CertChain.
//!
//! All metrics follow the naming convention: `certchain_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // REGISTRY METRICS
    // =========================================================================

    /// Certificates issued
    pub static ref CERTIFICATES_ISSUED: IntCounter = IntCounter::new(
        "certchain_certificates_issued_total",
        "Total number of certificates issued"
    ).expect("metric creation failed");

    /// Certificates revoked
    pub static ref CERTIFICATES_REVOKED: IntCounter = IntCounter::new(
        "certchain_certificates_revoked_total",
        "Total number of certificates revoked"
    ).expect("metric creation failed");

    /// Ledger anchoring failures (issue-time and explicit)
    pub static ref ANCHOR_FAILURES: IntCounter = IntCounter::new(
        "certchain_anchor_failures_total",
        "Total number of failed ledger anchor attempts"
    ).expect("metric creation failed");

    // =========================================================================
    // VERIFICATION METRICS
    // =========================================================================

    /// Verifications by outcome
    pub static ref VERIFICATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("certchain_verifications_total", "Verification attempts by outcome"),
        &["outcome"]  // valid/revoked/expired/tampered/not_found/anchor_mismatch
    ).expect("metric creation failed");

    /// Verifications scored as suspicious
    pub static ref SUSPICIOUS_VERIFICATIONS: IntCounter = IntCounter::new(
        "certchain_suspicious_verifications_total",
        "Verification attempts flagged as suspicious"
    ).expect("metric creation failed");

    // =========================================================================
    // HTTP METRICS
    // =========================================================================

    /// Requests by route class and status
    pub static ref HTTP_REQUESTS: IntCounterVec = IntCounterVec::new(
        Opts::new("certchain_http_requests_total", "HTTP requests handled"),
        &["method", "status"]
    ).expect("metric creation failed");

    /// Request latency
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "certchain_http_request_duration_seconds",
            "Time spent handling HTTP requests"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).expect("bucket layout is valid")),
        &["method"]
    ).expect("metric creation failed");

    /// Requests refused by the rate limiter
    pub static ref RATE_LIMITED_REQUESTS: IntCounter = IntCounter::new(
        "certchain_rate_limited_requests_total",
        "Requests rejected by per-IP rate limiting"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already-registered collectors are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CERTIFICATES_ISSUED.clone()),
        Box::new(CERTIFICATES_REVOKED.clone()),
        Box::new(ANCHOR_FAILURES.clone()),
        Box::new(VERIFICATIONS.clone()),
        Box::new(SUSPICIOUS_VERIFICATIONS.clone()),
        Box::new(HTTP_REQUESTS.clone()),
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(RATE_LIMITED_REQUESTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
