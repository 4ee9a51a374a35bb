//! Middleware stack for the gateway.
//!
//! Layer order (outermost first):
//! Trace → CORS → Metrics → ClientIp → RateLimit → Timeout → BodyLimit → Auth (per tier) → Handler

pub mod auth;
pub mod client_ip;
pub mod cors;
pub mod metrics;
pub mod rate_limit;

pub use auth::{authorize, constant_time_compare, AuthLayer};
pub use client_ip::{resolve_client_ip, ClientIp, ClientIpLayer};
pub use cors::create_cors_layer;
pub use metrics::{GatewayMetrics, HttpMetricsLayer, MetricsSnapshot};
pub use rate_limit::{cleanup_task, RateLimitLayer, RateLimitState};
