//! Typed generated content, one shape per campaign kind.
//!
//! The stored column holds the JSON of the inner struct; the campaign's
//! kind says which struct to read it as.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::campaign::CampaignKind;
use crate::core::CmsError;

/// Upper bound of a review rating; JSON-LD reports it as `bestRating`
pub const MAX_RATING: f32 = 5.0;

/// Suggested link to another record of the silo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalLink {
    pub slug: String,
    pub anchor_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    #[serde(default)]
    pub body: String,
}

/// Landing page copy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandingContent {
    pub headline: String,
    #[serde(default)]
    pub subheadline: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
    #[serde(default)]
    pub cta_text: String,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub internal_links: Vec<InternalLink>,
}

/// Blog review article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlogContent {
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    pub intro: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
    #[serde(default)]
    pub internal_links: Vec<InternalLink>,
}

/// Hub and sub-hub pillar copy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubContent {
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    pub intro: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub internal_links: Vec<InternalLink>,
}

/// Content union keyed by campaign kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CampaignContent {
    Landing(LandingContent),
    Blog(BlogContent),
    Hub(HubContent),
}

impl CampaignContent {
    /// Empty content of the right shape
    pub fn empty(kind: CampaignKind) -> Self {
        match kind {
            CampaignKind::Landing => CampaignContent::Landing(LandingContent::default()),
            CampaignKind::Blog => CampaignContent::Blog(BlogContent::default()),
            CampaignKind::HubPrincipal | CampaignKind::Subhub => {
                CampaignContent::Hub(HubContent::default())
            }
        }
    }

    /// Strictly validate an untyped value against the shape for `kind`.
    ///
    /// `null` means "no content yet" and yields the empty shape.
    pub fn from_value(kind: CampaignKind, value: serde_json::Value) -> Result<Self, CmsError> {
        if value.is_null() {
            return Ok(Self::empty(kind));
        }

        let parsed = match kind {
            CampaignKind::Landing => serde_json::from_value(value).map(CampaignContent::Landing),
            CampaignKind::Blog => serde_json::from_value(value).map(CampaignContent::Blog),
            CampaignKind::HubPrincipal | CampaignKind::Subhub => {
                serde_json::from_value(value).map(CampaignContent::Hub)
            }
        };

        let content = parsed.map_err(|e| {
            CmsError::validation(format!("Content does not match '{}' shape: {}", kind, e))
        })?;
        content.check_ranges()?;
        Ok(content)
    }

    fn check_ranges(&self) -> Result<(), CmsError> {
        if let CampaignContent::Blog(BlogContent {
            rating: Some(rating),
            ..
        }) = self
        {
            if !(0.0..=MAX_RATING).contains(rating) {
                return Err(CmsError::validation(format!(
                    "Rating {} is outside 0-{}",
                    rating, MAX_RATING
                )));
            }
        }
        Ok(())
    }

    /// Read a stored blob, degrading to empty content when it is corrupt
    pub fn from_stored(kind: CampaignKind, raw: &str) -> Self {
        let result = serde_json::from_str::<serde_json::Value>(raw)
            .map_err(|e| CmsError::MalformedResponse(e.to_string()))
            .and_then(|value| Self::from_value(kind, value));

        match result {
            Ok(content) => content,
            Err(e) => {
                warn!(%kind, error = %e, "Stored content unreadable, rendering empty");
                Self::empty(kind)
            }
        }
    }

    pub fn meta_title(&self) -> &str {
        match self {
            CampaignContent::Landing(c) => &c.meta_title,
            CampaignContent::Blog(c) => &c.meta_title,
            CampaignContent::Hub(c) => &c.meta_title,
        }
    }

    pub fn meta_description(&self) -> &str {
        match self {
            CampaignContent::Landing(c) => &c.meta_description,
            CampaignContent::Blog(c) => &c.meta_description,
            CampaignContent::Hub(c) => &c.meta_description,
        }
    }

    pub fn internal_links(&self) -> &[InternalLink] {
        match self {
            CampaignContent::Landing(c) => &c.internal_links,
            CampaignContent::Blog(c) => &c.internal_links,
            CampaignContent::Hub(c) => &c.internal_links,
        }
    }

    pub fn faq(&self) -> &[FaqEntry] {
        match self {
            CampaignContent::Landing(c) => &c.faq,
            CampaignContent::Blog(c) => &c.faq,
            CampaignContent::Hub(_) => &[],
        }
    }

    /// Short plain-text summary used as a fallback description
    pub fn summary(&self) -> &str {
        match self {
            CampaignContent::Landing(c) if !c.subheadline.is_empty() => &c.subheadline,
            CampaignContent::Landing(c) => &c.headline,
            CampaignContent::Blog(c) => &c.intro,
            CampaignContent::Hub(c) => &c.intro,
        }
    }
}
