use axum::body::Body;
use axum::Router;
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use zeroize::Zeroizing;

use crisper::config::{Config, DeployMode};
use crisper::server;
use crisper::state::AppState;

const ALLOWED_ORIGIN: &str = "http://localhost:5173";
const BLOCKED_ORIGIN: &str = "https://evil.example.com";

fn test_config(upstream_api_key: Option<&str>) -> Config {
    Config {
        mode: DeployMode::Production,
        // Nothing listens here; requests that pass the gate fail fast as
        // network errors instead of reaching a real upstream.
        upstream_url: "http://127.0.0.1:9/generate".to_string(),
        upstream_api_key: upstream_api_key.map(|k| Zeroizing::new(k.to_string())),
        allowed_origins: vec!["crisper-recipes.example.app".to_string()],
        generate_limit: 10,
        analyze_limit: 5,
    }
}

fn app(upstream_api_key: Option<&str>) -> Router {
    server::router(AppState::new(&test_config(upstream_api_key)))
}

fn post_json(path: &str, origin: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn missing_origin_is_forbidden() {
    let app = app(Some("k"));
    let response = app
        .oneshot(post_json("/api/generate", None, r#"{"prompt":"hi"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unlisted_origin_is_forbidden() {
    let app = app(Some("k"));
    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some(BLOCKED_ORIGIN),
            r#"{"prompt":"hi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_string(response).await;
    assert!(body.contains("Forbidden"));
}

#[tokio::test]
async fn localhost_origin_passes_the_origin_check() {
    // No upstream key configured: passing the gate surfaces the
    // configuration error, not a 403.
    let app = app(None);
    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some(ALLOWED_ORIGIN),
            r#"{"prompt":"hi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("Server configuration error"));
}

#[tokio::test]
async fn configured_production_origin_is_allowed() {
    let app = app(None);
    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some("https://crisper-recipes.example.app"),
            r#"{"prompt":"hi"}"#,
        ))
        .await
        .unwrap();

    // Past the origin check; fails later on missing server credential.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn empty_prompt_is_rejected() {
    let app = app(Some("k"));
    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some(ALLOWED_ORIGIN),
            r#"{"prompt":"  "}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_prompt_is_rejected() {
    let app = app(Some("k"));
    let prompt = "x".repeat(10_001);
    let body = sonic_rs::to_string(&sonic_rs::json!({ "prompt": prompt })).unwrap();
    let response = app
        .oneshot(post_json("/api/generate", Some(ALLOWED_ORIGIN), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("Prompt too long"));
}

#[tokio::test]
async fn generation_quota_rejects_the_eleventh_request() {
    let app = app(None);

    for _ in 0..10 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/generate",
                Some(ALLOWED_ORIGIN),
                r#"{"prompt":"hi"}"#,
            ))
            .await
            .unwrap();
        // Within quota: fails later on missing server credential.
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some(ALLOWED_ORIGIN),
            r#"{"prompt":"hi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_string(response).await;
    assert!(body.contains("wait a moment"));
}

#[tokio::test]
async fn origin_check_runs_before_quota() {
    let app = app(None);

    // Far more blocked requests than the quota ceiling: every one must be a
    // 403, never a 429, because origin rejection precedes quota counting.
    for _ in 0..15 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/generate",
                Some(BLOCKED_ORIGIN),
                r#"{"prompt":"hi"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn invalid_payloads_still_consume_quota() {
    let app = app(Some("k"));

    // Quota counting happens in middleware, before the handler ever sees
    // the body, so validation failures burn quota too.
    for _ in 0..10 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/generate",
                Some(ALLOWED_ORIGIN),
                r#"{"prompt":""}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some(ALLOWED_ORIGIN),
            r#"{"prompt":""}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn validation_runs_before_the_upstream_key_check() {
    // No key configured, but the invalid prompt must be reported first.
    let app = app(None);
    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some(ALLOWED_ORIGIN),
            r#"{"prompt":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("Prompt is required"));
}

#[tokio::test]
async fn analyze_image_quota_is_lower() {
    let app = app(None);

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/analyze-image",
                Some(ALLOWED_ORIGIN),
                r#"{"imageBase64":"aGVsbG8="}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let response = app
        .oneshot(post_json(
            "/api/analyze-image",
            Some(ALLOWED_ORIGIN),
            r#"{"imageBase64":"aGVsbG8="}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn empty_image_payload_is_rejected() {
    let app = app(Some("k"));
    let response = app
        .oneshot(post_json(
            "/api/analyze-image",
            Some(ALLOWED_ORIGIN),
            r#"{"imageBase64":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("Image data is required"));
}

#[tokio::test]
async fn oversized_image_payload_is_rejected() {
    let app = app(Some("k"));
    let image = "a".repeat(7 * 1024 * 1024 + 1);
    let body = sonic_rs::to_string(&sonic_rs::json!({ "imageBase64": image })).unwrap();
    let response = app
        .oneshot(post_json("/api/analyze-image", Some(ALLOWED_ORIGIN), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("Image too large"));
}

#[tokio::test]
async fn gate_passed_requests_reach_the_upstream() {
    // Key configured and gate passed: the unreachable upstream surfaces as a
    // network failure, proving no gate stage swallowed the request.
    let app = app(Some("k"));
    let response = app
        .oneshot(post_json(
            "/api/generate",
            Some(ALLOWED_ORIGIN),
            r#"{"prompt":"hi"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn preflight_is_answered_permissively() {
    let app = app(Some("k"));
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/generate")
        .header(header::ORIGIN, BLOCKED_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn non_post_verbs_are_rejected() {
    let app = app(Some("k"));
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/generate")
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
