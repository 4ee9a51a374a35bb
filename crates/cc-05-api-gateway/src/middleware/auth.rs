//! Authentication middleware.
//!
//! Enforces route tiers based on API key and client locality.

use crate::domain::config::AuthConfig;
use crate::domain::error::ApiError;
use crate::domain::tier::RouteTier;
use crate::middleware::client_ip::ClientIp;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Authentication layer for one route tier
#[derive(Clone)]
pub struct AuthLayer {
    config: Arc<AuthConfig>,
    tier: RouteTier,
}

impl AuthLayer {
    pub fn new(config: Arc<AuthConfig>, tier: RouteTier) -> Self {
        Self { config, tier }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            config: Arc::clone(&self.config),
            tier: self.tier,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    config: Arc<AuthConfig>,
    tier: RouteTier,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let config = Arc::clone(&self.config);
        let tier = self.tier;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if let Err(denied) = authorize(&req, &config, tier) {
                warn!(
                    path = %req.uri().path(),
                    tier = tier.as_str(),
                    code = denied.code,
                    "Request denied"
                );
                return Ok(denied.into_response());
            }
            inner.call(req).await
        })
    }
}

/// Decide whether `req` may reach a route of `tier`.
pub fn authorize<B>(req: &Request<B>, config: &AuthConfig, tier: RouteTier) -> Result<(), ApiError> {
    if tier == RouteTier::Public {
        return Ok(());
    }

    let Some(expected) = config.api_key.as_deref() else {
        return Err(ApiError::forbidden(format!(
            "{} routes are disabled: no API key configured",
            tier.as_str()
        )));
    };

    if tier == RouteTier::Admin && !config.allow_external_admin {
        let is_localhost = req
            .extensions()
            .get::<ClientIp>()
            .is_some_and(ClientIp::is_localhost);
        if !is_localhost {
            return Err(ApiError::forbidden("admin routes require localhost access"));
        }
    }

    let has_valid_key = presented_key(req).is_some_and(|key| constant_time_compare(key, expected));
    debug!(tier = tier.as_str(), has_valid_key, "Checking route authorization");
    if !has_valid_key {
        return Err(ApiError::unauthorized("missing or invalid API key"));
    }
    Ok(())
}

/// API key from `Authorization: Bearer` or `X-API-Key`.
fn presented_key<B>(req: &Request<B>) -> Option<&str> {
    if let Some(auth) = req.headers().get("authorization") {
        if let Some(token) = auth.to_str().ok().and_then(|s| s.strip_prefix("Bearer ")) {
            return Some(token.trim());
        }
    }
    req.headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

/// Constant-time string comparison
///
/// Both inputs are padded to the longer length with different bytes, and
/// the length check is folded into the same constant-time result.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);
    (lengths_equal & contents_equal).into()
}
