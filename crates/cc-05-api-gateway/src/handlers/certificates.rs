//! Certificate routes.

use super::{parse_body, record_miss, request_context, AppState};
use crate::domain::error::ApiResult;
use crate::middleware::ClientIp;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use cc_01_eligibility::{CourseOutline, EligibilityReport, LearnerProgress};
use cc_02_certificate_registry::{
    Certificate, CertificatePatch, CertificateView, IssueRequest, RegistryError,
    VerificationResult,
};
use cc_04_ledger_anchor::AnchorReceipt;
use certchain_telemetry::log_certificate_event;
use serde::Deserialize;
use shared_types::{CertificateId, CourseId, LearnerId};
use tracing::instrument;

const SUBSYSTEM: &str = "gateway";

/// Default `revoked_by` when the caller does not name itself.
pub const DEFAULT_REVOKER: &str = "issuer-api";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevokeBody {
    pub reason: String,
    #[serde(default)]
    pub revoked_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EligibilityBody {
    pub outline: CourseOutline,
    pub progress: LearnerProgress,
}

// ═══════════════════════════════════════════════════════════════════════
// PUBLIC
// ═══════════════════════════════════════════════════════════════════════

/// GET /api/v1/certificates/:id
///
/// Misses are written to the verification log so lookups feed the same
/// enumeration heuristics as verifications.
#[instrument(skip(state, client_ip, headers))]
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
) -> ApiResult<Json<CertificateView>> {
    let ctx = request_context(client_ip.map(|Extension(ip)| ip), &headers);
    let parsed = match CertificateId::parse(id.as_str()) {
        Ok(parsed) => parsed,
        Err(e) => {
            record_miss(&state, id, &ctx)?;
            return Err(e.into());
        }
    };
    match state.registry.get(&parsed) {
        Ok(certificate) => Ok(Json(certificate.view())),
        Err(err @ RegistryError::NotFound(_)) => {
            record_miss(&state, id, &ctx)?;
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /api/v1/certificates/:id/verify
///
/// A malformed id is still recorded as a miss before it is rejected.
#[instrument(skip(state, client_ip, headers))]
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
) -> ApiResult<Json<VerificationResult>> {
    let ctx = request_context(client_ip.map(|Extension(ip)| ip), &headers);
    if let Err(e) = CertificateId::parse(id.as_str()) {
        state.registry.verify(&id, &ctx).await?;
        return Err(e.into());
    }
    let result = state.registry.verify(&id, &ctx).await?;
    Ok(Json(result))
}

/// GET /api/v1/verify/hash/:hash
#[instrument(skip(state, client_ip, headers))]
pub async fn verify_by_hash(
    State(state): State<AppState>,
    Path(hash): Path<String>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
) -> ApiResult<Json<VerificationResult>> {
    let ctx = request_context(client_ip.map(|Extension(ip)| ip), &headers);
    let result = state.registry.verify_by_hash(&hash, &ctx).await?;
    Ok(Json(result))
}

/// GET /api/v1/learners/:id/certificates
#[instrument(skip(state))]
pub async fn list_learner_certificates(
    State(state): State<AppState>,
    Path(learner_id): Path<String>,
) -> ApiResult<Json<Vec<CertificateView>>> {
    let learner_id = LearnerId::parse(learner_id)?;
    let certificates = state.registry.list_by_learner(&learner_id)?;
    Ok(Json(certificates.iter().map(Certificate::view).collect()))
}

/// POST /api/v1/eligibility
///
/// Dry run: reports gaps without issuing anything.
#[instrument(skip(state, body))]
pub async fn check_eligibility(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<EligibilityReport>> {
    let EligibilityBody { outline, progress } = parse_body(&body)?;
    let report = state.registry.check_eligibility(&outline, &progress)?;
    Ok(Json(report))
}

// ═══════════════════════════════════════════════════════════════════════
// ISSUER
// ═══════════════════════════════════════════════════════════════════════

/// POST /api/v1/certificates
#[instrument(skip(state, body))]
pub async fn issue_certificate(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<(StatusCode, Json<Certificate>)> {
    let request: IssueRequest = parse_body(&body)?;
    let certificate = state.registry.issue(request).await?;
    log_certificate_event!(
        debug,
        SUBSYSTEM,
        "Issued via API",
        certificate.certificate_id
    );
    Ok((StatusCode::CREATED, Json(certificate)))
}

/// PATCH /api/v1/certificates/:id
#[instrument(skip(state, body))]
pub async fn update_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<Json<Certificate>> {
    let id = CertificateId::parse(id)?;
    let patch: CertificatePatch = parse_body(&body)?;
    let certificate = state.registry.update(&id, &patch)?;
    Ok(Json(certificate))
}

/// POST /api/v1/certificates/:id/revoke
#[instrument(skip(state, body))]
pub async fn revoke_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> ApiResult<Json<Certificate>> {
    let id = CertificateId::parse(id)?;
    let RevokeBody { reason, revoked_by } = parse_body(&body)?;
    let revoked_by = revoked_by.unwrap_or_else(|| DEFAULT_REVOKER.to_string());
    let certificate = state.registry.revoke(&id, &reason, &revoked_by)?;
    Ok(Json(certificate))
}

/// POST /api/v1/certificates/:id/anchor
#[instrument(skip(state))]
pub async fn anchor_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnchorReceipt>> {
    let id = CertificateId::parse(id)?;
    let receipt = state.registry.anchor(&id).await?;
    Ok(Json(receipt))
}

/// GET /api/v1/courses/:id/certificates
#[instrument(skip(state))]
pub async fn list_course_certificates(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<Vec<Certificate>>> {
    let course_id = CourseId::parse(course_id)?;
    let certificates = state.registry.list_by_course(&course_id)?;
    Ok(Json(certificates))
}
