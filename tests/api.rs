//! HTTP surface tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`. The
//! end-to-end PDF test needs a Chromium install and is ignored by default.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use storybook_pdf_service::config::{AssetConfig, BrowserConfig, Config, ServerConfig};
use storybook_pdf_service::{app, AppState};

fn test_app() -> axum::Router {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        browser: BrowserConfig {
            executable_path: "/usr/bin/chromium".into(),
        },
        assets: AssetConfig {
            dir: Some("assets/pdf-templates".into()),
            hot_reload: false,
        },
    };
    app(AppState::new(config))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_service_identity() {
    let response = test_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "storybook-pdf-service");
}

#[tokio::test]
async fn generate_rejects_empty_body_without_pdf_bytes() {
    let response = test_app()
        .oneshot(post_json("/api/pdf/generate", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(!content_type.contains("application/pdf"));
    let json = body_json(response.into_body()).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("Missing required fields"));
    assert!(error.contains("story"));
    assert!(error.contains("childName"));
    assert!(error.contains("selectedGender"));
}

#[tokio::test]
async fn text_only_shares_the_validation_contract() {
    let response = test_app()
        .oneshot(post_json(
            "/api/pdf/generate-text-only",
            serde_json::json!({ "childName": "דן" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("story"));
    assert!(!error.contains("childName"));
}

#[tokio::test]
async fn cover_does_not_require_gender() {
    let response = test_app()
        .oneshot(post_json(
            "/api/pdf/generate-cover",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("story"));
    assert!(!error.contains("selectedGender"));
}

#[tokio::test]
#[ignore = "requires a Chromium install"]
async fn generate_produces_pdf_bytes_end_to_end() {
    let response = test_app()
        .oneshot(post_json(
            "/api/pdf/generate",
            serde_json::json!({
                "story": {
                    "title": "הרפתקה קטנה",
                    "pages": [
                        { "text": "שלום [שם הילד]" },
                        { "text": "סוף טוב" }
                    ]
                },
                "childName": "נועה",
                "childAge": 5,
                "selectedGender": "girl"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/pdf")
    );
    assert_eq!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("no-cache, no-store, must-revalidate")
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}
