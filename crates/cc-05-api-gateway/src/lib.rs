//! # REST Gateway (cc-05)
//!
//! HTTP surface of CertChain: issuers create and manage certificates,
//! anyone can verify them, and operators read the audit trail.
//!
//! ## Architecture
//!
//! ```text
//!  client ──► Trace ─► CORS ─► Metrics ─► ClientIp ─► RateLimit ─► Timeout ─► BodyLimit
//!                                                                                 │
//!                                        ┌────────────────────┬───────────────────┤
//!                                        ▼                    ▼                   ▼
//!                                     public        Auth(Issuer) routes   Auth(Admin) routes
//!                                        │                    │                   │
//!                                        └─────────► CertificateRegistryApi ◄─────┘
//!                                                      VerificationLog, LocalLedger
//! ```
//!
//! ## Route Tiers
//!
//! | Tier | Requirement | Routes |
//! |------|-------------|--------|
//! | Public | none | health, get, verify, verify by hash, learner list, eligibility dry run |
//! | Issuer | API key | issue, update, revoke, anchor, course list |
//! | Admin | API key AND localhost | verification log, stats, integrity, `/metrics` |
//!
//! With no API key configured, issuer and admin routes answer 403.
//!
//! ## Security
//!
//! - Constant-time API key comparison
//! - Forwarded-for header honoured only from trusted proxies
//! - Per-IP token buckets, with a stricter bucket for verification routes
//! - Internal errors never leak their cause to the client

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod service;

pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use domain::tier::{RateClass, RouteTier};
pub use handlers::AppState;
pub use middleware::{ClientIp, GatewayMetrics, RateLimitState};
pub use service::ApiGatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
