//! API Gateway service: router assembly and the HTTP server.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::tier::RouteTier;
use crate::handlers::{admin, certificates, health, AppState};
use crate::middleware::{
    cleanup_task, create_cors_layer, AuthLayer, ClientIpLayer, GatewayMetrics, HttpMetricsLayer,
    RateLimitLayer, RateLimitState,
};
use axum::{
    routing::{get, post},
    Router,
};
use cc_02_certificate_registry::CertificateRegistryApi;
use cc_03_verification_log::VerificationLog;
use cc_04_ledger_anchor::LocalLedger;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// How often idle rate limit buckets are swept.
const BUCKET_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// REST gateway in front of the certificate registry
pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
}

impl ApiGatewayService {
    /// Create a new API Gateway service
    pub fn new(
        config: GatewayConfig,
        registry: Arc<dyn CertificateRegistryApi>,
        log: Arc<VerificationLog>,
        ledger: Option<Arc<LocalLedger>>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let state = AppState {
            registry,
            log,
            ledger,
            rate_limit: Arc::new(RateLimitState::new(config.rate_limit.clone())),
            metrics: Arc::new(GatewayMetrics::new()),
            limits: config.limits.clone(),
            started_at: Instant::now(),
        };

        Ok(Self { config, state })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Get rate limit state (for the cleanup task)
    pub fn rate_limit_state(&self) -> Arc<RateLimitState> {
        Arc::clone(&self.state.rate_limit)
    }

    /// Build the full router with middleware.
    pub fn router(&self) -> Router {
        let auth = Arc::new(self.config.auth.clone());

        let public = Router::new()
            .route("/health", get(health))
            .route(
                "/api/v1/certificates/:id",
                get(certificates::get_certificate),
            )
            .route(
                "/api/v1/certificates/:id/verify",
                get(certificates::verify_certificate),
            )
            .route(
                "/api/v1/verify/hash/:hash",
                get(certificates::verify_by_hash),
            )
            .route(
                "/api/v1/learners/:id/certificates",
                get(certificates::list_learner_certificates),
            )
            .route(
                "/api/v1/eligibility",
                post(certificates::check_eligibility),
            );

        let issuer = Router::new()
            .route(
                "/api/v1/certificates",
                post(certificates::issue_certificate),
            )
            .route(
                "/api/v1/certificates/:id",
                axum::routing::patch(certificates::update_certificate),
            )
            .route(
                "/api/v1/certificates/:id/revoke",
                post(certificates::revoke_certificate),
            )
            .route(
                "/api/v1/certificates/:id/anchor",
                post(certificates::anchor_certificate),
            )
            .route(
                "/api/v1/courses/:id/certificates",
                get(certificates::list_course_certificates),
            )
            .route_layer(AuthLayer::new(Arc::clone(&auth), RouteTier::Issuer));

        let admin = Router::new()
            .route(
                "/api/v1/admin/verifications",
                get(admin::recent_verifications),
            )
            .route(
                "/api/v1/admin/verifications/suspicious",
                get(admin::suspicious_verifications),
            )
            .route("/api/v1/admin/stats", get(admin::stats))
            .route("/api/v1/admin/integrity", get(admin::integrity))
            .route("/metrics", get(admin::prometheus_metrics))
            .route_layer(AuthLayer::new(auth, RouteTier::Admin));

        // Innermost layer first; each `.layer` wraps everything above it.
        public
            .merge(issuer)
            .merge(admin)
            .layer(RequestBodyLimitLayer::new(self.config.limits.max_request_size))
            .layer(TimeoutLayer::new(self.config.timeouts.request))
            .layer(RateLimitLayer::new(Arc::clone(&self.state.rate_limit)))
            .layer(ClientIpLayer::new(self.config.security.clone()))
            .layer(HttpMetricsLayer::new(Arc::clone(&self.state.metrics)))
            .layer(create_cors_layer(&self.config.cors))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        let router = self.router();

        let cleanup = tokio::spawn(cleanup_task(
            self.rate_limit_state(),
            BUCKET_CLEANUP_INTERVAL,
        ));

        // Once `shutdown` fires, in-flight requests get `shutdown_grace`
        // to finish before the server future is dropped.
        let grace = self.config.timeouts.shutdown_grace;
        let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
        let shutdown = async move {
            shutdown.await;
            let _ = signalled_tx.send(());
        };

        info!(addr = %addr, "Starting HTTP server");
        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .into_future();

        let result = tokio::select! {
            result = server => result.map_err(|e| GatewayError::Serve(e.to_string())),
            () = async {
                if signalled_rx.await.is_err() {
                    std::future::pending::<()>().await;
                }
                tokio::time::sleep(grace).await;
            } => {
                warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed, dropping open connections");
                Ok(())
            }
        };

        cleanup.abort();
        info!("API Gateway stopped");
        result
    }
}
