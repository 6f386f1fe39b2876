//! Cron Endpoint Integration Tests
//!
//! Key check, per-client rate limit and draft creation for
//! `GET /cron/auto-post`.

mod common;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;

use std::sync::Arc;

use affilio::{router, AppState, SqliteCampaignStore};
use common::{
    body_json, body_string, get, send, test_config, test_state, StubProvider, CRON_SECRET,
};

async fn cron_from(app: &Router, ip: &str) -> Response<Body> {
    let request = Request::get(format!("/cron/auto-post?key={}", CRON_SECRET))
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_wrong_key_is_rejected_without_side_effects() {
    let provider = StubProvider::blog();
    let state = test_state(provider.clone());
    let app = router(state.clone());

    let response = get(&app, "/cron/auto-post?key=nope").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["error"].is_string());

    let response = get(&app, "/cron/auto-post").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(provider.calls(), 0);
    assert!(state.campaigns.list().await.unwrap().is_empty());
    // Rejected keys do not consume rate limit budget
    assert_eq!(state.limiter.tracked(), 0);
}

#[tokio::test]
async fn test_success_creates_draft() {
    let provider = StubProvider::blog();
    let state = test_state(provider.clone());
    let app = router(state.clone());

    let response = cron_from(&app, "203.0.113.7").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "5");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");
    assert!(response.headers().contains_key("x-ratelimit-reset"));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["rateLimitRemaining"], 4);
    let created = body["created"].as_str().unwrap();
    assert!(created.starts_with("draft-"));
    assert!(body["trend"].is_string());
    assert!(body["category"].is_string());

    let stored = state.campaigns.get_by_slug(created).await.unwrap();
    assert!(stored.is_draft());
    assert_eq!(provider.calls(), 1);

    // Drafts stay out of the sitemap
    let xml = body_string(get(&app, "/sitemap.xml").await).await;
    assert!(!xml.contains(created));
}

#[tokio::test]
async fn test_sixth_call_is_rate_limited() {
    let provider = StubProvider::blog();
    let app = router(test_state(provider.clone()));

    for expected_remaining in (0..5).rev() {
        let response = cron_from(&app, "198.51.100.1, 10.0.0.1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["rateLimitRemaining"],
            expected_remaining
        );
    }

    let response = cron_from(&app, "198.51.100.1").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(provider.calls(), 5);

    // Another client has its own window
    let response = cron_from(&app, "192.0.2.44").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_generation_reports_error() {
    let provider = StubProvider::new("Sorry, I cannot help with that.");
    let state = test_state(provider.clone());
    let app = router(state.clone());

    let response = cron_from(&app, "203.0.113.9").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "4");

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Malformed"));
    assert!(state.campaigns.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_secret_disables_cron() {
    let provider = StubProvider::blog();
    let mut config = test_config();
    config.cron.secret = Some(String::new());
    let store = SqliteCampaignStore::open_in_memory().unwrap();
    let state = AppState::new(config, Arc::new(store), provider.clone());
    let app = router(state.clone());

    let response = get(&app, "/cron/auto-post?key=").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(provider.calls(), 0);
    assert!(state.campaigns.list().await.unwrap().is_empty());
}
