//! Adapter interfaces for external generation providers.
//!
//! Adapters wrap the wire protocol of a generative-language API behind
//! a small async trait so the generation client can be exercised
//! against stubs.

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gemini::GeminiProvider;

/// A model advertised by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Full model name, e.g. `models/gemini-1.5-flash`
    pub name: String,

    /// Methods the model supports (e.g. `generateContent`)
    #[serde(default)]
    pub supported_methods: Vec<String>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            name: name.into(),
            supported_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn supports(&self, method: &str) -> bool {
        self.supported_methods.iter().any(|m| m == method)
    }
}

/// Provider-level failures, before they are mapped to `CmsError`
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("credential rejected: {0}")]
    Unauthorized(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport: {0}")]
    Transport(String),

    #[error("unexpected payload: {0}")]
    Decode(String),
}

/// Trait for generative-language providers
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// List models visible to this credential
    async fn list_models(&self, api_key: &str) -> Result<Vec<ModelInfo>, ProviderError>;

    /// Run one prompt and return the raw text of the first candidate
    async fn generate_text(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
    ) -> Result<String, ProviderError>;
}
