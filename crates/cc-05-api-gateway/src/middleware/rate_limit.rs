//! Per-IP token bucket rate limiting.
//!
//! Every request draws from the client's general bucket. Verification
//! requests also draw from a smaller verification bucket, which slows down
//! certificate enumeration without throttling normal browsing.

use crate::domain::config::RateLimitConfig;
use crate::domain::error::ApiError;
use crate::domain::tier::RateClass;
use crate::middleware::client_ip::ClientIp;
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use certchain_telemetry::RATE_LIMITED_REQUESTS;
use dashmap::DashMap;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::{Layer, Service};
use tracing::{debug, warn};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

fn quota(per_second: u32, burst: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN))
        .allow_burst(NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN))
}

/// Token buckets for one client
struct ClientBuckets {
    general: DirectLimiter,
    verification: DirectLimiter,
    last_access: Instant,
}

impl ClientBuckets {
    fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: RateLimiter::direct(quota(config.requests_per_second, config.burst_size)),
            verification: RateLimiter::direct(quota(
                config.verifications_per_second,
                config.verification_burst_size,
            )),
            last_access: Instant::now(),
        }
    }
}

/// Rate limiter state shared across requests
pub struct RateLimitState {
    buckets: DashMap<IpAddr, ClientBuckets>,
    config: RateLimitConfig,
    clock: DefaultClock,
    rejected: AtomicU64,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
            clock: DefaultClock::default(),
            rejected: AtomicU64::new(0),
        }
    }

    /// Check whether a request should be allowed; `Err` carries the wait.
    pub fn check(&self, ip: IpAddr, class: RateClass) -> Result<(), Duration> {
        if !self.config.enabled || self.config.whitelist.contains(&ip) {
            return Ok(());
        }

        let mut bucket = self.buckets.entry(ip).or_insert_with(|| {
            debug!(ip = %ip, "Creating new rate limit bucket");
            ClientBuckets::new(&self.config)
        });
        bucket.last_access = Instant::now();

        let result = bucket
            .general
            .check()
            .and_then(|_| match class {
                RateClass::General => Ok(()),
                RateClass::Verification => bucket.verification.check(),
            })
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()));

        if result.is_err() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// Drop buckets idle for longer than `max_age`.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.buckets.retain(|ip, bucket| {
            let age = now.duration_since(bucket.last_access);
            if age > max_age {
                debug!(ip = %ip, age_secs = age.as_secs(), "Removing stale rate limit bucket");
                false
            } else {
                true
            }
        });
    }

    /// Number of tracked client IPs
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Requests rejected since start
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn idle_timeout(&self) -> Duration {
        self.config.idle_timeout
    }
}

/// Rate limit layer
#[derive(Clone)]
pub struct RateLimitLayer {
    state: Arc<RateLimitState>,
}

impl RateLimitLayer {
    pub fn new(state: Arc<RateLimitState>) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Rate limit service
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    state: Arc<RateLimitState>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
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
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ip = req
                .extensions()
                .get::<ClientIp>()
                .map(|c| c.0)
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
            let class = RateClass::for_request(req.method(), req.uri().path());

            match state.check(ip, class) {
                Ok(()) => inner.call(req).await,
                Err(retry_after) => {
                    let retry_ms = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX);
                    RATE_LIMITED_REQUESTS.inc();
                    warn!(
                        ip = %ip,
                        retry_after_ms = retry_ms,
                        class = ?class,
                        "Rate limit exceeded"
                    );
                    Ok(ApiError::rate_limited(retry_ms).into_response())
                }
            }
        })
    }
}

/// Background task to clean up stale rate limit buckets
pub async fn cleanup_task(state: Arc<RateLimitState>, interval: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        state.cleanup(state.idle_timeout());
    }
}
