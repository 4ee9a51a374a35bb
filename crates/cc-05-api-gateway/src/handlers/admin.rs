//! Admin routes. Localhost + API key unless external admin is enabled.

use super::{AppState, ListQuery};
use crate::domain::error::{ApiError, ApiResult};
use crate::middleware::MetricsSnapshot;
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use cc_02_certificate_registry::RegistryStats;
use cc_03_verification_log::{ChainReport, LogStats, VerificationEntry};
use cc_04_ledger_anchor::LedgerChainReport;
use serde::Serialize;
use tracing::{instrument, warn};

#[derive(Debug, Serialize)]
pub struct GatewayStats {
    #[serde(flatten)]
    pub requests: MetricsSnapshot,
    pub rate_limit_buckets: usize,
    pub rate_limit_rejected: u64,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub registry: RegistryStats,
    pub verifications: LogStats,
    pub gateway: GatewayStats,
    pub ledger_height: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    /// `true` only when every checked chain is intact.
    pub ok: bool,
    pub verification_log: ChainReport,
    pub ledger: Option<LedgerChainReport>,
}

/// GET /api/v1/admin/verifications
#[instrument(skip(state))]
pub async fn recent_verifications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<VerificationEntry>> {
    Json(state.log.recent(query.resolve(&state.limits)))
}

/// GET /api/v1/admin/verifications/suspicious
#[instrument(skip(state))]
pub async fn suspicious_verifications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<VerificationEntry>> {
    Json(state.log.suspicious(query.resolve(&state.limits)))
}

/// GET /api/v1/admin/stats
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<AdminStats>> {
    let registry = state.registry.stats()?;
    Ok(Json(AdminStats {
        registry,
        verifications: state.log.stats(),
        gateway: GatewayStats {
            requests: state.metrics.snapshot(),
            rate_limit_buckets: state.rate_limit.bucket_count(),
            rate_limit_rejected: state.rate_limit.rejected(),
            uptime_secs: state.started_at.elapsed().as_secs(),
        },
        ledger_height: state.ledger.as_ref().map(|l| l.height()),
    }))
}

/// GET /api/v1/admin/integrity
#[instrument(skip(state))]
pub async fn integrity(State(state): State<AppState>) -> Json<IntegrityReport> {
    let verification_log = state.log.verify_chain();
    let ledger = state.ledger.as_ref().map(|l| l.verify_chain());
    let ok = verification_log.intact && ledger.as_ref().map_or(true, |r| r.intact);
    if !ok {
        warn!(
            log_intact = verification_log.intact,
            ledger_intact = ?ledger.as_ref().map(|r| r.intact),
            "Integrity check failed"
        );
    }
    Json(IntegrityReport {
        ok,
        verification_log,
        ledger,
    })
}

/// GET /metrics
pub async fn prometheus_metrics() -> ApiResult<Response> {
    let body = certchain_telemetry::encode_metrics().map_err(ApiError::internal)?;
    let mut response = body.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    Ok(response)
}
