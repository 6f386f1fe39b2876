//! Admin API Integration Tests
//!
//! Generation, update and delete through `/api`.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};

use affilio::router;
use common::{body_json, send, test_state, StubProvider, ADMIN_TOKEN};

const LANDING_REPLY: &str = r#"{"headline": "Espresso X", "subheadline": "Barista coffee at home", "benefits": ["Fast"], "meta_title": "Espresso X | Best price"}"#;

async fn admin(app: &Router, method: Method, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN));
    let request = match payload {
        Some(payload) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = send(app, request).await;
    let status = response.status();
    let body = if status == StatusCode::NO_CONTENT {
        Value::Null
    } else {
        body_json(response).await
    };
    (status, body)
}

#[tokio::test]
async fn test_generate_preview_does_not_persist() {
    let provider = StubProvider::new(LANDING_REPLY);
    let state = test_state(provider.clone());
    let app = router(state.clone());

    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({"product_name": "Espresso X", "kind": "landing", "category": "home"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "models/gemini-stub");
    assert_eq!(body["campaign"]["slug"], "espresso-x");
    assert_eq!(body["campaign"]["title"], "Espresso X | Best price");
    assert_eq!(body["campaign"]["description"], "<p>Barista coffee at home</p>");
    assert!(state.campaigns.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_and_save() {
    let provider = StubProvider::new(LANDING_REPLY);
    let state = test_state(provider.clone());
    let app = router(state.clone());

    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({
            "product_name": "Espresso X",
            "kind": "landing",
            "category": "home",
            "affiliate_link": "https://shop.example.com/x",
            "save": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"]["headline"], "Espresso X");
    let stored = state.campaigns.get_by_slug("espresso-x").await.unwrap();
    assert_eq!(stored.affiliate_link, "https://shop.example.com/x");
}

#[tokio::test]
async fn test_generate_requires_product_name() {
    let provider = StubProvider::new(LANDING_REPLY);
    let app = router(test_state(provider.clone()));

    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({"product_name": "", "kind": "landing", "category": "home"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Product name"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_malformed_generation_is_bad_gateway() {
    let provider = StubProvider::new("{\"headline\": ");
    let app = router(test_state(provider));

    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({"product_name": "Espresso X", "kind": "landing", "category": "home"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = router(test_state(StubProvider::new(LANDING_REPLY)));

    let (status, created) = admin(
        &app,
        Method::POST,
        "/api/campaigns",
        Some(json!({
            "slug": "laptop-z",
            "kind": "landing",
            "category": "tech",
            "product_name": "Laptop Z",
            "title": "Laptop Z",
            "content": {"headline": "Laptop Z"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/campaigns/{}", created["id"].as_str().unwrap());

    let (status, updated) = admin(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"title": "Laptop Z (2026)", "category": "office"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Laptop Z (2026)");
    assert_eq!(updated["slug"], "laptop-z");

    // Mismatched content for the kind is rejected
    let (status, _) = admin(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"content": {"intro": "no headline"}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = admin(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = admin(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_debug_models() {
    let app = router(test_state(StubProvider::new(LANDING_REPLY)));

    let (status, body) = admin(&app, Method::GET, "/api/debug/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "stub");
    assert_eq!(body["models"].as_array().unwrap().len(), 2);
    assert_eq!(body["selected"], "models/gemini-stub");
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let app = router(test_state(StubProvider::new(LANDING_REPLY)));

    let request = Request::get("/api/campaigns")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_out_of_range_rating_is_rejected() {
    let provider = StubProvider::new(r#"{"intro": "x", "verdict": "Buy", "rating": 42}"#);
    let state = test_state(provider.clone());
    let app = router(state.clone());

    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({"product_name": "Espresso X", "kind": "blog", "category": "home", "save": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("Rating"));
    assert!(state.campaigns.list().await.unwrap().is_empty());

    let (status, _) = admin(
        &app,
        Method::POST,
        "/api/campaigns",
        Some(json!({
            "slug": "espresso-x",
            "kind": "blog",
            "category": "home",
            "product_name": "Espresso X",
            "title": "Espresso X",
            "content": {"intro": "x", "rating": -1}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_kind_generates_landing() {
    let provider = StubProvider::new(LANDING_REPLY);
    let app = router(test_state(provider.clone()));

    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({"product_name": "Espresso X", "kind": "newsletter", "category": "home"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["campaign"]["kind"], "landing");
    assert_eq!(body["campaign"]["content"]["headline"], "Espresso X");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_bad_request_bodies_use_error_json() {
    let app = router(test_state(StubProvider::new(LANDING_REPLY)));

    // Missing required fields
    let (status, body) = admin(
        &app,
        Method::POST,
        "/api/campaigns",
        Some(json!({"slug": "no-kind"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    // Not JSON at all
    let request = Request::post("/api/generate")
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"].is_string());

    // Id that is not a UUID
    let (status, body) = admin(&app, Method::GET, "/api/campaigns/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}
