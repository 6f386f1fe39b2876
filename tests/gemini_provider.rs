//! Gemini Adapter Integration Tests
//!
//! Runs the HTTP adapter against an in-process mock of the provider API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use affilio::adapters::{GeminiProvider, GenerationProvider, ProviderError};
use affilio::{CmsError, GenerationClient};

const GOOD_KEY: &str = "good-key";

fn key_ok(query: &HashMap<String, String>) -> bool {
    query.get("key").map(String::as_str) == Some(GOOD_KEY)
}

async fn list_models(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !key_ok(&query) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": {"message": "API key not valid"}})));
    }
    (
        StatusCode::OK,
        Json(json!({
            "models": [
                {"name": "models/embedding-001", "supportedGenerationMethods": ["embedContent"]},
                {"name": "models/gemini-1.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]}
            ]
        })),
    )
}

async fn generate(
    Path(action): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !key_ok(&query) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "forbidden"})));
    }
    if action != "gemini-1.5-flash:generateContent" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": action})));
    }

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    let reply = if prompt.contains("empty") {
        json!({"candidates": []})
    } else {
        json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "```json\n{\"headline\": \"Espresso X\","},
                    {"text": " \"benefits\": [\"Fast\"]}\n```"}
                ]}
            }]
        })
    };
    (StatusCode::OK, Json(reply))
}

/// Start the mock and return its base URL
async fn mock_provider() -> String {
    let app = Router::new()
        .route("/v1beta/models", get(list_models))
        .route("/v1beta/models/{action}", post(generate));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/v1beta", addr)
}

#[tokio::test]
async fn test_list_models() {
    let provider = GeminiProvider::new(mock_provider().await);

    let models = provider.list_models(GOOD_KEY).await.unwrap();
    assert_eq!(models.len(), 2);
    assert!(models[1].supports("generateContent"));
    assert!(!models[0].supports("generateContent"));
}

#[tokio::test]
async fn test_bad_key_is_unauthorized() {
    let provider = GeminiProvider::new(mock_provider().await);

    let result = provider.list_models("bad").await;
    assert!(matches!(result, Err(ProviderError::Unauthorized(_))));

    let client = GenerationClient::new(Arc::new(provider), "gemini");
    assert_eq!(
        client.select_model("bad").await.unwrap_err(),
        CmsError::InvalidCredential
    );
}

#[tokio::test]
async fn test_select_and_generate_through_client() {
    let provider = GeminiProvider::new(mock_provider().await);
    let client = GenerationClient::new(Arc::new(provider), "gemini");

    let model = client.select_model(GOOD_KEY).await.unwrap();
    assert_eq!(model, "models/gemini-1.5-flash");

    // Parts are joined and fences stripped before parsing
    let value = client.generate("write copy", GOOD_KEY, &model).await.unwrap();
    assert_eq!(value["headline"], "Espresso X");
    assert_eq!(value["benefits"][0], "Fast");
}

#[tokio::test]
async fn test_no_candidate_is_malformed() {
    let provider = GeminiProvider::new(mock_provider().await);
    let client = GenerationClient::new(Arc::new(provider), "gemini");

    let result = client
        .generate("empty please", GOOD_KEY, "gemini-1.5-flash")
        .await;
    assert!(matches!(result, Err(CmsError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_unknown_family_has_no_model() {
    let provider = GeminiProvider::new(mock_provider().await);
    let client = GenerationClient::new(Arc::new(provider), "claude");

    assert_eq!(
        client.select_model(GOOD_KEY).await.unwrap_err(),
        CmsError::NoModelAvailable
    );
}
