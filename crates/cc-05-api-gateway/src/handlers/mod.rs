//! HTTP handlers.
//!
//! - `certificates`: issuance, lookup, verification and lifecycle routes
//! - `admin`: audit log, stats, integrity checks and Prometheus metrics

pub mod admin;
pub mod certificates;

use crate::domain::config::LimitsConfig;
use crate::domain::error::{ApiError, ApiResult};
use crate::middleware::{ClientIp, GatewayMetrics, RateLimitState};
use axum::http::HeaderMap;
use axum::Json;
use cc_02_certificate_registry::CertificateRegistryApi;
use cc_03_verification_log::{VerificationAttempt, VerificationLog, VerificationOutcome};
use cc_04_ledger_anchor::LocalLedger;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use shared_types::RequestContext;
use std::sync::Arc;
use std::time::Instant;

/// Header a verifier may use to identify itself.
pub const VERIFIER_HEADER: &str = "x-verifier";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn CertificateRegistryApi>,
    pub log: Arc<VerificationLog>,
    pub ledger: Option<Arc<LocalLedger>>,
    pub rate_limit: Arc<RateLimitState>,
    pub metrics: Arc<GatewayMetrics>,
    pub limits: LimitsConfig,
    pub started_at: Instant,
}

/// Liveness check
pub async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

/// `?limit=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Requested limit, defaulted and clamped to `[1, max_list_limit]`.
    pub fn resolve(&self, limits: &LimitsConfig) -> usize {
        self.limit
            .unwrap_or(limits.default_list_limit)
            .clamp(1, limits.max_list_limit.max(1))
    }
}

/// Parse a JSON body, mapping failures onto the API error shape.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    if body.trim().is_empty() {
        return Err(ApiError::invalid_request("request body is empty"));
    }
    serde_json::from_str(body).map_err(|e| ApiError::invalid_request(format!("invalid JSON body: {e}")))
}

/// Build the audit context for a verification request.
pub(crate) fn request_context(client_ip: Option<ClientIp>, headers: &HeaderMap) -> RequestContext {
    let mut ctx = RequestContext::new(client_ip.and_then(|ip| ip.known()));
    if let Some(ua) = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        ctx = ctx.with_user_agent(ua);
    }
    if let Some(verifier) = headers.get(VERIFIER_HEADER).and_then(|v| v.to_str().ok()) {
        ctx = ctx.with_verifier(verifier);
    }
    ctx
}

/// Write a lookup that found nothing to the verification log.
pub(crate) fn record_miss(state: &AppState, subject: String, ctx: &RequestContext) -> ApiResult<()> {
    state
        .log
        .record(VerificationAttempt {
            subject,
            outcome: VerificationOutcome::NotFound,
            client_ip: ctx.client_ip,
            user_agent: ctx.user_agent.clone(),
            verifier: ctx.verifier.clone(),
        })
        .map_err(ApiError::internal)?;
    Ok(())
}
