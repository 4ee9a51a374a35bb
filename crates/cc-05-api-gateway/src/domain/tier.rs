//! Route tiers and rate classes.

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Who may call a route.
///
/// - **Public**: anyone
/// - **Issuer**: valid API key
/// - **Admin**: valid API key AND localhost (unless external admin is allowed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteTier {
    Public,
    Issuer,
    Admin,
}

impl RouteTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteTier::Public => "public",
            RouteTier::Issuer => "issuer",
            RouteTier::Admin => "admin",
        }
    }
}

/// Which token bucket a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateClass {
    General,
    Verification,
}

impl RateClass {
    /// Verification endpoints and single-certificate lookups get the
    /// stricter bucket.
    pub fn for_request(method: &Method, path: &str) -> Self {
        let single_lookup = *method == Method::GET
            && path
                .strip_prefix("/api/v1/certificates/")
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'));
        if path.starts_with("/api/v1/verify/") || path.ends_with("/verify") || single_lookup {
            RateClass::Verification
        } else {
            RateClass::General
        }
    }
}
