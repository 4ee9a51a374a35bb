//! API error type and the mapping from registry errors to HTTP statuses.
//!
//! Every error leaves the gateway as
//! `{"error": {"code": "...", "message": "...", "details": ...}}`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cc_02_certificate_registry::RegistryError;
use cc_04_ledger_anchor::AnchorError;
use serde::Serialize;
use shared_types::IdError;
use std::fmt;
use tracing::error;

/// Machine-readable error codes
pub mod codes {
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const INVALID_ID: &str = "invalid_id";
    pub const INVALID_PROGRESS: &str = "invalid_progress";
    pub const NOT_ELIGIBLE: &str = "not_eligible";
    pub const ALREADY_ISSUED: &str = "already_issued";
    pub const ALREADY_REVOKED: &str = "already_revoked";
    pub const ALREADY_ANCHORED: &str = "already_anchored";
    pub const CERTIFICATE_REVOKED: &str = "certificate_revoked";
    pub const IMMUTABLE_FIELD: &str = "immutable_field";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const ANCHOR_UNAVAILABLE: &str = "anchor_unavailable";
    pub const ANCHOR_REJECTED: &str = "anchor_rejected";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// API error with HTTP status and code
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, codes::FORBIDDEN, message)
    }

    pub fn rate_limited(retry_after_ms: u64) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            codes::RATE_LIMITED,
            "Rate limit exceeded",
        )
        .with_details(serde_json::json!({ "retry_after_ms": retry_after_ms }))
    }

    /// Internal failure. The cause is logged, never returned.
    pub fn internal(cause: impl fmt::Display) -> Self {
        error!(error = %cause, "Internal error while handling request");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            "Internal server error",
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.status.as_u16(), self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ApiError", 3)?;
        state.serialize_field("code", self.code)?;
        state.serialize_field("message", &self.message)?;
        if let Some(ref details) = self.details {
            state.serialize_field("details", details)?;
        }
        state.end()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let retry_after = self
            .details
            .as_ref()
            .and_then(|d| d.get("retry_after_ms"))
            .and_then(|v| v.as_u64());
        let unauthorized = status == StatusCode::UNAUTHORIZED;

        let mut response = (status, Json(serde_json::json!({ "error": self }))).into_response();
        if let Some(ms) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(ms.div_ceil(1000)));
        }
        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err {
            RegistryError::NotFound(_) => ApiError::not_found(message),
            RegistryError::NotEligible { gaps } => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, codes::NOT_ELIGIBLE, message)
                    .with_details(serde_json::json!({ "gaps": gaps }))
            }
            RegistryError::AlreadyIssued { certificate_id } => {
                ApiError::new(StatusCode::CONFLICT, codes::ALREADY_ISSUED, message)
                    .with_details(serde_json::json!({ "certificate_id": certificate_id }))
            }
            RegistryError::AlreadyRevoked(_) => {
                ApiError::new(StatusCode::CONFLICT, codes::ALREADY_REVOKED, message)
            }
            RegistryError::AlreadyAnchored(_) => {
                ApiError::new(StatusCode::CONFLICT, codes::ALREADY_ANCHORED, message)
            }
            RegistryError::CertificateRevoked(_) => {
                ApiError::new(StatusCode::CONFLICT, codes::CERTIFICATE_REVOKED, message)
            }
            RegistryError::ImmutableField { field } => {
                ApiError::new(StatusCode::CONFLICT, codes::IMMUTABLE_FIELD, message)
                    .with_details(serde_json::json!({ "field": field }))
            }
            RegistryError::InvalidRequest(_) => ApiError::invalid_request(message),
            RegistryError::InvalidId(e) => e.into(),
            RegistryError::Eligibility(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, codes::INVALID_PROGRESS, message)
            }
            RegistryError::Anchor(e) => e.into(),
            RegistryError::Audit(e) => ApiError::internal(e),
            RegistryError::Storage(e) => ApiError::internal(e),
        }
    }
}

impl From<AnchorError> for ApiError {
    fn from(err: AnchorError) -> Self {
        let message = err.to_string();
        match err {
            AnchorError::AlreadyAnchored { .. } => {
                ApiError::new(StatusCode::CONFLICT, codes::ALREADY_ANCHORED, message)
            }
            AnchorError::Unavailable(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::ANCHOR_UNAVAILABLE,
                message,
            ),
            AnchorError::Rejected(_) => {
                ApiError::new(StatusCode::BAD_GATEWAY, codes::ANCHOR_REJECTED, message)
            }
            AnchorError::Storage(_) => ApiError::internal(message),
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, codes::INVALID_ID, err.to_string())
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server bind error: {0}")]
    Bind(String),

    #[error("server error: {0}")]
    Serve(String),
}
