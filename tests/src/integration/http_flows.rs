//! # HTTP Flows
//!
//! The full lifecycle through the gateway router built by the node
//! container, driven with `tower::ServiceExt::oneshot`.

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use shared_types::ManualTimeSource;
    use tower::ServiceExt;

    use crate::fixtures::*;

    const ISSUER_HOST: &str = "10.0.0.20";
    const PUBLIC_HOST: &str = "198.51.100.7";
    const LOCALHOST: &str = "127.0.0.1";

    async fn call(
        router: &Router,
        method: Method,
        uri: &str,
        peer: &str,
        key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, "integration/1.0");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let mut request = builder.body(body).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(peer.parse().unwrap(), 50_000)));

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn router() -> Router {
        let clock = ManualTimeSource::new(START);
        let node = node(node_config(), &clock);
        node.gateway().unwrap().router()
    }

    #[tokio::test]
    async fn test_lifecycle_over_http() {
        let router = router();

        // Dry run first.
        let (status, report) = call(
            &router,
            Method::POST,
            "/api/v1/eligibility",
            PUBLIC_HOST,
            None,
            Some(json!({ "outline": outline(), "progress": progress("ada", 85) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["eligible"], true);
        assert_eq!(report["grade"], "merit");

        let (status, issued) = call(
            &router,
            Method::POST,
            "/api/v1/certificates",
            ISSUER_HOST,
            Some(API_KEY),
            Some(serde_json::to_value(issue_request("ada", 85)).unwrap()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = issued["certificate_id"].as_str().unwrap().to_string();
        let hash = issued["content_hash"].as_str().unwrap().to_string();
        assert!(id.starts_with("CERT-20240315-"));

        let (status, verified) = call(
            &router,
            Method::GET,
            &format!("/api/v1/certificates/{id}/verify"),
            PUBLIC_HOST,
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verified["outcome"], "valid");
        assert_eq!(verified["anchor_check"], "confirmed");
        assert_eq!(verified["certificate"]["learner_name"], "Ada Lovelace");

        let (status, by_hash) = call(
            &router,
            Method::GET,
            &format!("/api/v1/verify/hash/{hash}"),
            PUBLIC_HOST,
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_hash["outcome"], "valid");

        let (status, patched) = call(
            &router,
            Method::PATCH,
            &format!("/api/v1/certificates/{id}"),
            ISSUER_HOST,
            Some(API_KEY),
            Some(json!({ "display_name_override": "Augusta Ada King" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["display_name_override"], "Augusta Ada King");

        let (status, _) = call(
            &router,
            Method::POST,
            &format!("/api/v1/certificates/{id}/revoke"),
            ISSUER_HOST,
            Some(API_KEY),
            Some(json!({ "reason": "issued in error", "revoked_by": "registrar" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, revoked) = call(
            &router,
            Method::GET,
            &format!("/api/v1/certificates/{id}/verify"),
            PUBLIC_HOST,
            None,
            None,
        )
        .await;
        assert_eq!(revoked["outcome"], "revoked");
        assert_eq!(revoked["valid"], false);

        let (status, listed) = call(
            &router,
            Method::GET,
            "/api/v1/learners/ada/certificates",
            PUBLIC_HOST,
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["status"], "revoked");

        let (status, stats) = call(
            &router,
            Method::GET,
            "/api/v1/admin/stats",
            LOCALHOST,
            Some(API_KEY),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["registry"]["total"], 1);
        assert_eq!(stats["registry"]["revoked"], 1);
        assert_eq!(stats["verifications"]["total"], 3);
        assert_eq!(stats["verifications"]["revoked"], 1);
        assert_eq!(stats["ledger_height"], 1);

        let (status, recent) = call(
            &router,
            Method::GET,
            "/api/v1/admin/verifications?limit=2",
            LOCALHOST,
            Some(API_KEY),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recent.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_course_listing_requires_issuer_key() {
        let router = router();
        call(
            &router,
            Method::POST,
            "/api/v1/certificates",
            ISSUER_HOST,
            Some(API_KEY),
            Some(serde_json::to_value(issue_request("ada", 85)).unwrap()),
        )
        .await;

        let uri = format!("/api/v1/courses/{COURSE}/certificates");
        let (status, body) = call(&router, Method::GET, &uri, PUBLIC_HOST, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");

        let (status, body) =
            call(&router, Method::GET, &uri, ISSUER_HOST, Some(API_KEY), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prometheus_exposes_domain_counters() {
        certchain_telemetry::register_metrics().unwrap();
        let router = router();
        call(
            &router,
            Method::POST,
            "/api/v1/certificates",
            ISSUER_HOST,
            Some(API_KEY),
            Some(serde_json::to_value(issue_request("ada", 85)).unwrap()),
        )
        .await;

        let mut request = Request::builder()
            .uri("/metrics")
            .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(LOCALHOST.parse().unwrap(), 50_000)));
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("certchain_certificates_issued_total"));
        assert!(text.contains("certchain_http_requests_total"));
    }
}
