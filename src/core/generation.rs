//! Generation client: model selection, the generation call and strict
//! JSON decoding of the reply.
//!
//! Every call is a single attempt. Failures come back as [`CmsError`]
//! values whose message is shown to the caller as-is.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::adapters::{GenerationProvider, ModelInfo, ProviderError};
use crate::core::CmsError;
use crate::domain::{CampaignContent, CampaignKind};

/// Method a model must support to be selectable
const GENERATE_METHOD: &str = "generateContent";

/// Generation client bound to one provider
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn GenerationProvider>,

    /// Substring a model name must contain (e.g. "gemini")
    model_family: String,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn GenerationProvider>, model_family: impl Into<String>) -> Self {
        Self {
            provider,
            model_family: model_family.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Pick the first available model of the configured family
    #[instrument(skip_all, fields(provider = %self.provider.name()))]
    pub async fn select_model(&self, api_key: &str) -> Result<String, CmsError> {
        let models = self.fetch_models(api_key).await?;

        let selected = models
            .into_iter()
            .find(|m| m.name.contains(&self.model_family) && m.supports(GENERATE_METHOD))
            .map(|m| m.name)
            .ok_or(CmsError::NoModelAvailable)?;

        info!(model = %selected, "Selected generation model");
        Ok(selected)
    }

    /// Names of every model the key can see, for connection diagnostics
    pub async fn debug_connection(&self, api_key: &str) -> Result<Vec<String>, CmsError> {
        let models = self.fetch_models(api_key).await?;
        Ok(models.into_iter().map(|m| m.name).collect())
    }

    /// Send the prompt and decode the reply as JSON
    #[instrument(skip(self, prompt, api_key), fields(prompt_len = prompt.len()))]
    pub async fn generate(
        &self,
        prompt: &str,
        api_key: &str,
        model_name: &str,
    ) -> Result<serde_json::Value, CmsError> {
        require_key(api_key)?;

        let raw = self
            .provider
            .generate_text(api_key, model_name, prompt)
            .await
            .map_err(map_provider_error)?;

        debug!(bytes = raw.len(), "Received generation response");
        parse_generated_json(&raw)
    }

    /// Generate and validate against the content shape for `kind`
    pub async fn generate_content(
        &self,
        kind: CampaignKind,
        prompt: &str,
        api_key: &str,
        model_name: &str,
    ) -> Result<CampaignContent, CmsError> {
        let value = self.generate(prompt, api_key, model_name).await?;

        CampaignContent::from_value(kind, value).map_err(|e| {
            warn!(%kind, error = %e, "Generated JSON does not match expected shape");
            CmsError::MalformedResponse(e.to_string())
        })
    }

    async fn fetch_models(&self, api_key: &str) -> Result<Vec<ModelInfo>, CmsError> {
        require_key(api_key)?;
        self.provider
            .list_models(api_key)
            .await
            .map_err(map_provider_error)
    }
}

fn require_key(api_key: &str) -> Result<(), CmsError> {
    if api_key.trim().is_empty() {
        return Err(CmsError::CredentialMissing);
    }
    Ok(())
}

fn map_provider_error(err: ProviderError) -> CmsError {
    match err {
        ProviderError::Unauthorized(_) => CmsError::InvalidCredential,
        ProviderError::Decode(msg) => CmsError::MalformedResponse(msg),
        other => CmsError::Provider(other.to_string()),
    }
}

/// Remove a surrounding ```json / ``` fence, if any
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) up to the first newline
        text = match rest.find('\n') {
            Some(idx) if rest[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[idx + 1..]
            }
            _ => rest.trim_start_matches("json"),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Strip fences and parse strictly
pub fn parse_generated_json(raw: &str) -> Result<serde_json::Value, CmsError> {
    serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| CmsError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider returning canned data
    struct StubProvider {
        models: Result<Vec<ModelInfo>, ProviderError>,
        reply: String,
        calls: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn with_reply(reply: &str) -> Self {
            Self {
                models: Ok(vec![
                    ModelInfo::new("models/embedding-001", &["embedContent"]),
                    ModelInfo::new("models/gemini-vision", &["countTokens"]),
                    ModelInfo::new("models/gemini-1.5-flash", &["generateContent"]),
                    ModelInfo::new("models/gemini-1.5-pro", &["generateContent"]),
                ]),
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn list_models(&self, _api_key: &str) -> Result<Vec<ModelInfo>, ProviderError> {
            self.models.clone()
        }

        async fn generate_text(
            &self,
            _api_key: &str,
            model: &str,
            _prompt: &str,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(model.to_string());
            Ok(self.reply.clone())
        }
    }

    fn client(provider: StubProvider) -> GenerationClient {
        GenerationClient::new(Arc::new(provider), "gemini")
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_generated_json() {
        let value = parse_generated_json("```json\n{\"headline\": \"Hi\"}\n```").unwrap();
        assert_eq!(value["headline"], "Hi");

        for bad in ["", "```json\n```", "{\"headline\": ", "Sure! Here is your JSON"] {
            assert!(matches!(
                parse_generated_json(bad),
                Err(CmsError::MalformedResponse(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_select_model_filters_family_and_method() {
        let client = client(StubProvider::with_reply("{}"));
        let model = client.select_model("key").await.unwrap();
        assert_eq!(model, "models/gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_select_model_errors() {
        let client = client(StubProvider::with_reply("{}"));
        assert_eq!(client.select_model("  ").await, Err(CmsError::CredentialMissing));

        let mut empty = StubProvider::with_reply("{}");
        empty.models = Ok(vec![]);
        assert_eq!(
            self::client(empty).select_model("key").await,
            Err(CmsError::NoModelAvailable)
        );

        let mut rejected = StubProvider::with_reply("{}");
        rejected.models = Err(ProviderError::Unauthorized("API_KEY_INVALID".to_string()));
        assert_eq!(
            self::client(rejected).select_model("key").await,
            Err(CmsError::InvalidCredential)
        );
    }

    #[tokio::test]
    async fn test_generate_content_validates_shape() {
        let client = client(StubProvider::with_reply(
            "```json\n{\"intro\": \"Pillar intro\", \"sections\": []}\n```",
        ));

        let content = client
            .generate_content(CampaignKind::HubPrincipal, "prompt", "key", "models/gemini-1.5-flash")
            .await
            .unwrap();
        assert_eq!(content.summary(), "Pillar intro");

        // Same payload lacks the landing headline
        let result = client
            .generate_content(CampaignKind::Landing, "prompt", "key", "models/gemini-1.5-flash")
            .await;
        assert!(matches!(result, Err(CmsError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_malformed_reply() {
        let client = client(StubProvider::with_reply("I cannot help with that."));
        let result = client.generate("prompt", "key", "m").await;
        assert!(matches!(result, Err(CmsError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_debug_connection_lists_all_models() {
        let client = client(StubProvider::with_reply("{}"));
        let names = client.debug_connection("key").await.unwrap();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"models/embedding-001".to_string()));
    }
}
