//! Content generation pipeline.
//!
//! form input → prompt → model selection → generation → typed content
//! → campaign draft. Persisting the draft is a separate step; a failure
//! between the two leaves nothing behind.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::core::campaigns::CampaignService;
use crate::core::generation::GenerationClient;
use crate::core::prompt::{build_prompt, ContentRequest, PromptKind};
use crate::core::CmsError;
use crate::domain::{
    is_valid_category, is_valid_slug, slugify, Campaign, CampaignContent, CampaignKind, Language,
    NewCampaign,
};

/// Admin request to generate a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCampaign {
    pub product_name: String,
    #[serde(default)]
    pub context: String,
    /// Unknown type strings generate a landing page
    #[serde(deserialize_with = "lossy_kind")]
    pub kind: CampaignKind,
    pub category: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub tone: Option<String>,
    /// Defaults to the slugified product name
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub affiliate_link: String,
    #[serde(default)]
    pub image_url: String,
    /// Offer existing records of the category as link targets
    #[serde(default = "default_true")]
    pub suggest_links: bool,
}

fn default_true() -> bool {
    true
}

fn lossy_kind<'de, D>(deserializer: D) -> Result<CampaignKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.parse() {
        Ok(kind) => Ok(kind),
        Err(_) => {
            warn!(kind = %raw, "Unknown campaign type, generating a landing page");
            Ok(CampaignKind::parse_lossy(&raw))
        }
    }
}

impl GenerateCampaign {
    pub fn new(product_name: impl Into<String>, kind: CampaignKind, category: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            context: String::new(),
            kind,
            category: category.into(),
            language: Language::default(),
            tone: None,
            slug: None,
            parent_id: None,
            affiliate_link: String::new(),
            image_url: String::new(),
            suggest_links: true,
        }
    }
}

/// Generated but not yet persisted campaign
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedCampaign {
    pub model: String,
    pub campaign: NewCampaign,
}

/// Pipeline over a campaign service and a generation client
#[derive(Clone)]
pub struct ContentPipeline {
    campaigns: CampaignService,
    client: GenerationClient,
    api_key: String,
}

impl ContentPipeline {
    pub fn new(campaigns: CampaignService, client: GenerationClient, api_key: impl Into<String>) -> Self {
        Self {
            campaigns,
            client,
            api_key: api_key.into(),
        }
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Run generation and return a draft ready to save
    #[instrument(skip(self, input), fields(product = %input.product_name, kind = %input.kind))]
    pub async fn generate(&self, input: GenerateCampaign) -> Result<GeneratedCampaign, CmsError> {
        if input.product_name.trim().is_empty() {
            return Err(CmsError::validation("Product name is required before generation"));
        }
        if !is_valid_category(&input.category) {
            return Err(CmsError::validation(format!("Invalid category: '{}'", input.category)));
        }
        let slug = match &input.slug {
            Some(slug) => slug.clone(),
            None => slugify(&input.product_name),
        };
        if !is_valid_slug(&slug) {
            return Err(CmsError::validation(format!("Invalid slug: '{}'", slug)));
        }
        self.campaigns.silo().validate_parent(input.parent_id, None).await?;

        let siblings = if input.suggest_links {
            self.campaigns
                .silo()
                .siblings_for_linking(&input.category, None)
                .await?
        } else {
            Vec::new()
        };

        let mut request = ContentRequest::new(input.product_name.clone(), PromptKind::from(input.kind))
            .with_context(input.context.clone())
            .with_language(input.language)
            .with_siblings(siblings);
        if let Some(tone) = &input.tone {
            request = request.with_tone(tone.clone());
        }
        let prompt = build_prompt(&request)?;

        let model = self.client.select_model(&self.api_key).await?;
        let content = self
            .client
            .generate_content(input.kind, &prompt, &self.api_key, &model)
            .await?;

        let title = match content.meta_title().trim() {
            "" => input.product_name.trim().to_string(),
            t => t.to_string(),
        };
        let description = describe(&content);

        info!(%slug, %model, "Generated campaign content");

        Ok(GeneratedCampaign {
            model,
            campaign: NewCampaign {
                slug,
                kind: input.kind,
                category: input.category,
                language: input.language,
                product_name: input.product_name.trim().to_string(),
                title,
                description,
                affiliate_link: input.affiliate_link,
                image_url: input.image_url,
                gallery_images: Vec::new(),
                content: serde_json::to_value(&content)?,
                parent_id: input.parent_id,
            },
        })
    }

    /// Generate and persist in one go
    pub async fn generate_and_save(&self, input: GenerateCampaign) -> Result<Campaign, CmsError> {
        let generated = self.generate(input).await?;
        self.campaigns.create(generated.campaign).await
    }
}

/// Initial HTML description built from the generated summary
fn describe(content: &CampaignContent) -> String {
    let summary = match content.meta_description().trim() {
        "" => content.summary().trim(),
        d => d,
    };
    if summary.is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>", maud::html! { (summary) }.into_string())
    }
}
