//! Per-request context carried from the gateway into the domain services.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Maximum stored user agent length; longer values are truncated.
pub const MAX_USER_AGENT_LEN: usize = 256;

/// Who is asking and from where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Resolved client IP (after trusted proxy handling).
    pub client_ip: Option<IpAddr>,
    /// `User-Agent` header, truncated.
    pub user_agent: Option<String>,
    /// Self-declared verifier (e.g. an employer name), if provided.
    pub verifier: Option<String>,
}

impl RequestContext {
    pub fn new(client_ip: Option<IpAddr>) -> Self {
        Self {
            client_ip,
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        let ua = user_agent.into();
        let ua = ua.trim();
        self.user_agent = if ua.is_empty() {
            None
        } else {
            Some(truncate(ua, MAX_USER_AGENT_LEN))
        };
        self
    }

    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        let v = verifier.into();
        let v = v.trim();
        self.verifier = if v.is_empty() {
            None
        } else {
            Some(truncate(v, MAX_USER_AGENT_LEN))
        };
        self
    }
}

/// Copy of `value` cut to at most `max` bytes on a char boundary.
pub fn truncate(value: &str, max: usize) -> String {
    if value.len() <= max {
        return value.to_string();
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_user_agent_is_none() {
        let ctx = RequestContext::default().with_user_agent("   ");
        assert!(ctx.user_agent.is_none());
    }

    #[test]
    fn test_long_user_agent_truncated_on_char_boundary() {
        let long = "é".repeat(MAX_USER_AGENT_LEN);
        let ctx = RequestContext::default().with_user_agent(long);
        let ua = ctx.user_agent.unwrap();
        assert!(ua.len() <= MAX_USER_AGENT_LEN);
        assert!(ua.chars().all(|c| c == 'é'));
    }
}
