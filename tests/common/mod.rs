//! Shared fixtures for router-level tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use affilio::adapters::{GenerationProvider, ModelInfo, ProviderError};
use affilio::config::ResolvedConfig;
use affilio::{AppState, SqliteCampaignStore};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use tower::ServiceExt;

pub const CRON_SECRET: &str = "cron-secret";
pub const ADMIN_TOKEN: &str = "admin-token";

/// Provider returning a canned reply and counting generation calls
pub struct StubProvider {
    reply: String,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    /// Valid blog JSON wrapped in a code fence
    pub fn blog() -> Arc<Self> {
        Self::new(
            "```json\n{\"meta_title\": \"Trending pick\", \"intro\": \"What is hot right now\", \"sections\": []}\n```",
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn list_models(&self, _api_key: &str) -> Result<Vec<ModelInfo>, ProviderError> {
        Ok(vec![
            ModelInfo::new("models/embedding-001", &["embedContent"]),
            ModelInfo::new("models/gemini-stub", &["generateContent"]),
        ])
    }

    async fn generate_text(&self, _: &str, _: &str, _: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub fn test_config() -> ResolvedConfig {
    let mut config = ResolvedConfig::with_home(PathBuf::from("/tmp/affilio-test"));
    config.generation.api_key = "test-key".to_string();
    config.cron.secret = Some(CRON_SECRET.to_string());
    config.admin_token = Some(ADMIN_TOKEN.to_string());
    config.site.base_url = "https://example.com".to_string();
    config
}

pub fn test_state(provider: Arc<StubProvider>) -> AppState {
    let store = SqliteCampaignStore::open_in_memory().expect("in-memory store");
    AppState::new(test_config(), Arc::new(store), provider)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
