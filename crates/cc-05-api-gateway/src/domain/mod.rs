//! Gateway domain: configuration, errors and route classification.

pub mod config;
pub mod error;
pub mod tier;

pub use config::{
    AuthConfig, ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig,
    RateLimitConfig, SecurityConfig, TimeoutConfig,
};
pub use error::{ApiError, ApiResult, GatewayError};
pub use tier::{RateClass, RouteTier};
