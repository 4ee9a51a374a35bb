//! Client IP resolution.
//!
//! The forwarded-for header is honoured only when the direct peer is a
//! trusted proxy. The resolved address is stored as a [`ClientIp`] request
//! extension for rate limiting, auth and the verification log.

use crate::domain::config::SecurityConfig;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    response::Response,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Resolved client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl ClientIp {
    /// `None` when no peer address was available.
    pub fn known(&self) -> Option<IpAddr> {
        (!self.0.is_unspecified()).then_some(self.0)
    }

    pub fn is_localhost(&self) -> bool {
        self.0.is_loopback()
    }
}

/// Client IP layer
#[derive(Clone)]
pub struct ClientIpLayer {
    config: Arc<SecurityConfig>,
}

impl ClientIpLayer {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S> Layer<S> for ClientIpLayer {
    type Service = ClientIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientIpService {
            inner,
            config: Arc::clone(&self.config),
        }
    }
}

/// Client IP service
#[derive(Clone)]
pub struct ClientIpService<S> {
    inner: S,
    config: Arc<SecurityConfig>,
}

impl<S> Service<Request<Body>> for ClientIpService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let config = Arc::clone(&self.config);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Without a peer address nothing is trusted: unspecified is
            // neither loopback nor a proxy.
            let direct_ip = req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip())
                .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

            let client_ip = resolve_client_ip(&req, direct_ip, &config);
            req.extensions_mut().insert(ClientIp(client_ip));
            inner.call(req).await
        })
    }
}

/// Determine the client IP based on trusted proxy configuration
pub fn resolve_client_ip<B>(req: &Request<B>, direct_ip: IpAddr, config: &SecurityConfig) -> IpAddr {
    let header = req
        .headers()
        .get(config.real_ip_header.as_str())
        .and_then(|v| v.to_str().ok());

    if !is_trusted_proxy(direct_ip, config) {
        if header.is_some() {
            warn!(
                direct_ip = %direct_ip,
                header = %config.real_ip_header,
                "Ignoring forwarded address from untrusted peer"
            );
        }
        return direct_ip;
    }

    let Some(value) = header else {
        return direct_ip;
    };

    // X-Forwarded-For: client, proxy1, proxy2. Take the Nth from the right.
    let ips: Vec<&str> = value.split(',').map(str::trim).collect();
    let index = ips.len().saturating_sub(config.proxy_count.max(1));
    match ips.get(index).and_then(|s| s.parse::<IpAddr>().ok()) {
        Some(ip) => {
            debug!(value, extracted_ip = %ip, "Extracted client IP from header");
            ip
        }
        None => direct_ip,
    }
}

/// Check if an IP is a trusted proxy
fn is_trusted_proxy(ip: IpAddr, config: &SecurityConfig) -> bool {
    config.trusted_proxies.contains(&ip) || (config.trust_private_ips && is_private_ip(ip))
}

/// Check if IP is in private range
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => ipv4.is_private() || ipv4.is_link_local(),
        IpAddr::V6(ipv6) => {
            // Unique local addresses (fc00::/7)
            (ipv6.octets()[0] & 0xfe) == 0xfc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(forwarded: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder();
        if let Some(value) = forwarded {
            builder = builder.header("X-Forwarded-For", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn proxy_config() -> SecurityConfig {
        SecurityConfig {
            trusted_proxies: vec!["10.0.0.100".parse().unwrap()],
            ..Default::default()
        }
    }

    #[test]
    fn test_untrusted_peer_header_ignored() {
        let peer: IpAddr = "203.0.113.7".parse().unwrap();
        let ip = resolve_client_ip(&request(Some("127.0.0.1")), peer, &proxy_config());
        assert_eq!(ip, peer);
    }

    #[test]
    fn test_trusted_proxy_header_used() {
        let proxy: IpAddr = "10.0.0.100".parse().unwrap();
        let ip = resolve_client_ip(
            &request(Some("198.51.100.1, 198.51.100.20")),
            proxy,
            &proxy_config(),
        );
        assert_eq!(ip, "198.51.100.20".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_garbage_header_falls_back() {
        let proxy: IpAddr = "10.0.0.100".parse().unwrap();
        let ip = resolve_client_ip(&request(Some("not-an-ip")), proxy, &proxy_config());
        assert_eq!(ip, proxy);
    }

    #[test]
    fn test_private_ranges() {
        assert!(is_private_ip("10.1.2.3".parse().unwrap()));
        assert!(is_private_ip("192.168.1.1".parse().unwrap()));
        assert!(is_private_ip("fd00::1".parse().unwrap()));
        assert!(!is_private_ip("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_unspecified_is_unknown() {
        let ip = ClientIp(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(ip.known(), None);
        assert!(!ip.is_localhost());
        assert!(ClientIp("::1".parse().unwrap()).is_localhost());
    }
}
