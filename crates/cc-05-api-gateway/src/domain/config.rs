//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Issuer and admin credentials
    pub auth: AuthConfig,
    /// Per-IP rate limiting
    pub rate_limit: RateLimitConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// Request timeouts
    pub timeouts: TimeoutConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Proxy trust configuration
    pub security: SecurityConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "requests_per_second cannot be 0".into(),
            ));
        }
        if self.rate_limit.verifications_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "verifications_per_second cannot be 0".into(),
            ));
        }
        if self.rate_limit.burst_size == 0 || self.rate_limit.verification_burst_size == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "burst sizes cannot be 0".into(),
            ));
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }
        if self.limits.max_list_limit == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_list_limit cannot be 0".into(),
            ));
        }

        if self.timeouts.request.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request timeout cannot be 0".into(),
            ));
        }

        if let Some(key) = &self.auth.api_key {
            if key.trim().is_empty() {
                return Err(ConfigError::Invalid("api_key cannot be blank".into()));
            }
        }
        Ok(())
    }

    /// Stricter checks for a public deployment.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        match &self.auth.api_key {
            None => Err(ConfigError::MissingApiKey),
            Some(key) if key.len() < MIN_PRODUCTION_KEY_LEN => Err(ConfigError::Invalid(format!(
                "api_key must be at least {MIN_PRODUCTION_KEY_LEN} characters"
            ))),
            Some(_) => Ok(()),
        }
    }

    /// HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// Shortest API key accepted by `validate_for_production`.
pub const MIN_PRODUCTION_KEY_LEN: usize = 32;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
        }
    }
}

/// Issuer/admin authentication
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Key required for issuer and admin routes. `None` refuses those routes.
    pub api_key: Option<String>,
    /// Allow admin routes from non-localhost clients
    pub allow_external_admin: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("allow_external_admin", &self.allow_external_admin)
            .finish()
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests per second per IP (all routes)
    pub requests_per_second: u32,
    /// Burst allowance for general requests
    pub burst_size: u32,
    /// Verification requests per second per IP
    pub verifications_per_second: u32,
    /// Burst allowance for verification requests
    pub verification_burst_size: u32,
    /// Enable rate limiting
    pub enabled: bool,
    /// IPs exempt from rate limiting
    pub whitelist: Vec<IpAddr>,
    /// Idle time after which a client's buckets are dropped
    #[serde(with = "humantime_serde")]
    pub idle_timeout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 50,
            burst_size: 100,
            verifications_per_second: 5,
            verification_burst_size: 20,
            enabled: true,
            whitelist: Vec::new(),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 256KB)
    pub max_request_size: usize,
    /// Largest `limit` accepted by list endpoints
    pub max_list_limit: usize,
    /// `limit` used when none is given
    pub default_list_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 256 * 1024,
            max_list_limit: 1000,
            default_list_limit: 50,
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request: Duration,
    /// Time allowed for in-flight requests on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(15),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache, seconds
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PATCH".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "X-API-Key".to_string(),
                "X-Verifier".to_string(),
            ],
            max_age: 86400,
        }
    }
}

/// Proxy trust configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Peers allowed to set the real-IP header
    pub trusted_proxies: Vec<IpAddr>,
    /// Trust private IPs (10.x, 172.16.x, 192.168.x) as proxies
    pub trust_private_ips: bool,
    /// Header carrying the client IP behind a proxy
    pub real_ip_header: String,
    /// Number of proxies in chain (for X-Forwarded-For parsing)
    pub proxy_count: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            trusted_proxies: Vec::new(),
            trust_private_ips: false,
            real_ip_header: "X-Forwarded-For".to_string(),
            proxy_count: 1,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Production deployments need issuer credentials
    #[error("no api_key configured")]
    MissingApiKey,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
