//! Prompt construction for content generation.
//!
//! Building a prompt is a pure function of [`ContentRequest`]; nothing
//! here touches the network, so every branch is testable offline.

use serde::{Deserialize, Serialize};

use crate::core::CmsError;
use crate::domain::{CampaignKind, Language};

/// Template family used for the output schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Landing,
    Blog,
    Hub,
}

impl PromptKind {
    fn schema_example(&self) -> &'static str {
        match self {
            PromptKind::Landing => LANDING_SCHEMA,
            PromptKind::Blog => BLOG_SCHEMA,
            PromptKind::Hub => HUB_SCHEMA,
        }
    }

    fn role(&self) -> &'static str {
        match self {
            PromptKind::Landing => "a senior conversion copywriter writing a product landing page",
            PromptKind::Blog => "an expert product reviewer writing an in-depth, honest review article",
            PromptKind::Hub => "an SEO content strategist writing a pillar page that introduces a whole topic",
        }
    }
}

impl From<CampaignKind> for PromptKind {
    fn from(kind: CampaignKind) -> Self {
        match kind {
            CampaignKind::Landing => PromptKind::Landing,
            CampaignKind::Blog => PromptKind::Blog,
            // Sub-hubs store hub-shaped content
            CampaignKind::HubPrincipal | CampaignKind::Subhub => PromptKind::Hub,
        }
    }
}

/// Existing record offered to the model as a cross-link target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingRef {
    pub slug: String,
    pub title: String,
    pub category: String,
}

/// Everything the prompt depends on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub product_name: String,
    #[serde(default)]
    pub context: String,
    pub kind: PromptKind,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default)]
    pub siblings: Vec<SiblingRef>,
}

fn default_tone() -> String {
    "persuasive".to_string()
}

impl ContentRequest {
    pub fn new(product_name: impl Into<String>, kind: PromptKind) -> Self {
        Self {
            product_name: product_name.into(),
            context: String::new(),
            kind,
            language: Language::default(),
            tone: default_tone(),
            siblings: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_siblings(mut self, siblings: Vec<SiblingRef>) -> Self {
        self.siblings = siblings;
        self
    }
}

/// Assemble the full prompt
pub fn build_prompt(request: &ContentRequest) -> Result<String, CmsError> {
    let product = request.product_name.trim();
    if product.is_empty() {
        return Err(CmsError::validation("Product name is required before generation"));
    }

    let tone = match request.tone.trim() {
        "" => "persuasive",
        t => t,
    };
    let has_links = !request.siblings.is_empty();

    let mut prompt = String::with_capacity(2048);
    prompt.push_str(&format!(
        "You are {}. Write in {} with a {} tone.\n\n",
        request.kind.role(),
        request.language.display_name(),
        tone
    ));
    prompt.push_str(&format!("Product or topic: {}\n", product));

    let context = request.context.trim();
    if !context.is_empty() {
        prompt.push_str(&format!("Context provided by the editor:\n{}\n", context));
    }

    prompt.push_str(
        "\nRespond ONLY with a single valid JSON object, no markdown and no commentary, \
         reproducing exactly this structure:\n",
    );
    prompt.push_str(&schema_with_links(request.kind, has_links));
    prompt.push('\n');

    if has_links {
        prompt.push_str(
            "\nInternal linking: these pages already exist on the site. If, and only if, \
             some of them are genuinely relevant to this text, add them to \"internal_links\" \
             using their exact slug and a natural anchor text. Leave the array empty when \
             none fit.\n",
        );
        for sibling in &request.siblings {
            prompt.push_str(&format!(
                "- slug: {} | title: {} | category: {}\n",
                sibling.slug, sibling.title, sibling.category
            ));
        }
    }

    prompt.push_str(&format!(
        "\nAll text values must be written in {}. Keep meta_title under 60 characters \
         and meta_description under 160 characters.\n",
        request.language.display_name()
    ));

    Ok(prompt)
}

/// Schema example, with the `internal_links` key only when links are wanted
fn schema_with_links(kind: PromptKind, has_links: bool) -> String {
    let schema = kind.schema_example().trim_end();
    if !has_links {
        return schema.to_string();
    }

    // Splice the key in before the closing brace
    let body = schema.strip_suffix('}').unwrap_or(schema).trim_end();
    format!(
        "{},\n  \"internal_links\": [{{\"slug\": \"existing-slug\", \"anchor_text\": \"...\"}}]\n}}",
        body
    )
}

const LANDING_SCHEMA: &str = r#"{
  "headline": "...",
  "subheadline": "...",
  "benefits": ["...", "..."],
  "features": [{"title": "...", "description": "..."}],
  "faq": [{"question": "...", "answer": "..."}],
  "cta_text": "...",
  "meta_title": "...",
  "meta_description": "..."
}"#;

const BLOG_SCHEMA: &str = r#"{
  "meta_title": "...",
  "meta_description": "...",
  "intro": "...",
  "sections": [{"heading": "...", "body": "..."}],
  "pros": ["..."],
  "cons": ["..."],
  "verdict": "...",
  "rating": 4.5,
  "faq": [{"question": "...", "answer": "..."}]
}"#;

const HUB_SCHEMA: &str = r#"{
  "meta_title": "...",
  "meta_description": "...",
  "intro": "...",
  "sections": [{"heading": "...", "body": "..."}]
}"#;
