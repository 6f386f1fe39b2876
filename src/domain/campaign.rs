//! Campaign records: the single persisted entity.
//!
//! A campaign is a landing page, a blog review or a hub page. Hubs and
//! sub-hubs can parent other campaigns to form the internal-link silo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::CampaignContent;
use crate::core::CmsError;

/// Slug prefix marking records created by the automated pipeline
pub const DRAFT_PREFIX: &str = "draft-";

/// Kind of campaign record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignKind {
    /// Product landing page
    Landing,

    /// Blog review article
    Blog,

    /// Top-level pillar page
    HubPrincipal,

    /// Mid-level hub under a principal hub
    Subhub,
}

impl CampaignKind {
    /// Canonical string stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignKind::Landing => "landing",
            CampaignKind::Blog => "blog",
            CampaignKind::HubPrincipal => "hub_principal",
            CampaignKind::Subhub => "subhub",
        }
    }

    /// Whether records of this kind may parent other records
    pub fn can_parent(&self) -> bool {
        matches!(self, CampaignKind::HubPrincipal | CampaignKind::Subhub)
    }

    /// Kinds that may appear in a parent selector
    pub fn parent_kinds() -> [CampaignKind; 2] {
        [CampaignKind::HubPrincipal, CampaignKind::Subhub]
    }

    /// Parse a type string from a generation request; anything
    /// unrecognised gets the landing shape
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or(CampaignKind::Landing)
    }
}

impl std::fmt::Display for CampaignKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampaignKind {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "landing" => Ok(CampaignKind::Landing),
            "blog" => Ok(CampaignKind::Blog),
            "hub_principal" => Ok(CampaignKind::HubPrincipal),
            "subhub" => Ok(CampaignKind::Subhub),
            _ => Err(CmsError::validation(format!("Unknown campaign type: {}", s))),
        }
    }
}

/// Target language of generated copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,

    #[serde(rename = "en-US")]
    EnUs,

    #[serde(rename = "es-ES")]
    EsEs,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::PtBr => "pt-BR",
            Language::EnUs => "en-US",
            Language::EsEs => "es-ES",
        }
    }

    /// Human name used inside prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::PtBr => "Brazilian Portuguese",
            Language::EnUs => "English",
            Language::EsEs => "Spanish",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt-br" | "pt" => Ok(Language::PtBr),
            "en-us" | "en" => Ok(Language::EnUs),
            "es-es" | "es" => Ok(Language::EsEs),
            _ => Err(CmsError::validation(format!("Unknown language: {}", s))),
        }
    }
}

/// A persisted campaign
#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: Uuid,

    /// Unique URL key, immutable after creation
    pub slug: String,

    pub kind: CampaignKind,

    pub category: String,

    pub language: Language,

    pub product_name: String,

    pub title: String,

    /// Trusted admin HTML
    pub description: String,

    pub affiliate_link: String,

    pub image_url: String,

    /// Ordered gallery image URLs
    pub gallery_images: Vec<String>,

    pub content: CampaignContent,

    pub parent_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Canonical public path: `/{category}/{slug}`
    pub fn canonical_path(&self) -> String {
        format!("/{}/{}", self.category, self.slug)
    }

    /// Whether this record was created by the automated pipeline
    pub fn is_draft(&self) -> bool {
        self.slug.starts_with(DRAFT_PREFIX)
    }
}

/// Fields required to create a campaign.
///
/// `content` arrives untyped and is validated against `kind` before it
/// reaches storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub slug: String,
    pub kind: CampaignKind,
    pub category: String,
    #[serde(default)]
    pub language: Language,
    pub product_name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub affiliate_link: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl NewCampaign {
    /// Validate fields and build the record to persist
    pub fn into_campaign(self) -> Result<Campaign, CmsError> {
        if !is_valid_slug(&self.slug) {
            return Err(CmsError::validation(format!("Invalid slug: '{}'", self.slug)));
        }
        if !is_valid_category(&self.category) {
            return Err(CmsError::validation(format!(
                "Invalid category: '{}'",
                self.category
            )));
        }
        if self.product_name.trim().is_empty() {
            return Err(CmsError::validation("Product name is required"));
        }
        if self.title.trim().is_empty() {
            return Err(CmsError::validation("Title is required"));
        }

        let content = CampaignContent::from_value(self.kind, self.content)?;
        let now = Utc::now();

        Ok(Campaign {
            id: Uuid::new_v4(),
            slug: self.slug,
            kind: self.kind,
            category: self.category,
            language: self.language,
            product_name: self.product_name,
            title: self.title,
            description: self.description,
            affiliate_link: self.affiliate_link,
            image_url: self.image_url,
            gallery_images: self.gallery_images,
            content,
            parent_id: self.parent_id,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. There is no slug field: slugs never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub kind: Option<CampaignKind>,
    pub category: Option<String>,
    pub language: Option<Language>,
    pub product_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub affiliate_link: Option<String>,
    pub image_url: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub content: Option<serde_json::Value>,
    /// `Some(None)` clears the parent
    #[serde(default, with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

impl CampaignUpdate {
    /// Apply to an existing record, revalidating what changed
    pub fn apply(self, campaign: &mut Campaign) -> Result<(), CmsError> {
        if let Some(category) = self.category {
            if !is_valid_category(&category) {
                return Err(CmsError::validation(format!("Invalid category: '{}'", category)));
            }
            campaign.category = category;
        }
        if let Some(product_name) = self.product_name {
            if product_name.trim().is_empty() {
                return Err(CmsError::validation("Product name is required"));
            }
            campaign.product_name = product_name;
        }
        if let Some(title) = self.title {
            if title.trim().is_empty() {
                return Err(CmsError::validation("Title is required"));
            }
            campaign.title = title;
        }

        let kind_changed = self.kind.is_some_and(|k| k != campaign.kind);
        if let Some(kind) = self.kind {
            campaign.kind = kind;
        }
        match self.content {
            Some(value) => campaign.content = CampaignContent::from_value(campaign.kind, value)?,
            None if kind_changed => {
                return Err(CmsError::validation(
                    "Changing the campaign type requires new content",
                ))
            }
            None => {}
        }

        if let Some(language) = self.language {
            campaign.language = language;
        }
        if let Some(description) = self.description {
            campaign.description = description;
        }
        if let Some(link) = self.affiliate_link {
            campaign.affiliate_link = link;
        }
        if let Some(image) = self.image_url {
            campaign.image_url = image;
        }
        if let Some(gallery) = self.gallery_images {
            campaign.gallery_images = gallery;
        }
        if let Some(parent) = self.parent_id {
            campaign.parent_id = parent;
        }

        campaign.updated_at = Utc::now();
        Ok(())
    }
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(
        value: &Option<Option<T>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<T>>, D::Error> {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Check `^[a-z0-9]+(-[a-z0-9]+)*$`
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// First path segments owned by the server rather than a category index
pub const RESERVED_CATEGORIES: [&str; 3] = ["api", "cron", "health"];

/// A slug that does not shadow a server route
pub fn is_valid_category(s: &str) -> bool {
    is_valid_slug(s) && !RESERVED_CATEGORIES.contains(&s)
}

/// Turn free text into a slug (ASCII-folds common Latin accents)
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_landing(slug: &str) -> NewCampaign {
        NewCampaign {
            slug: slug.to_string(),
            kind: CampaignKind::Landing,
            category: "tech".to_string(),
            language: Language::EnUs,
            product_name: "Widget".to_string(),
            title: "Widget".to_string(),
            description: String::new(),
            affiliate_link: String::new(),
            image_url: String::new(),
            gallery_images: vec![],
            content: json!({"headline": "Buy it"}),
            parent_id: None,
        }
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            CampaignKind::Landing,
            CampaignKind::Blog,
            CampaignKind::HubPrincipal,
            CampaignKind::Subhub,
        ] {
            assert_eq!(kind.as_str().parse::<CampaignKind>().unwrap(), kind);
        }
        assert!("hub_secundario".parse::<CampaignKind>().is_err());
    }

    #[test]
    fn test_parse_lossy_defaults_to_landing() {
        assert_eq!(CampaignKind::parse_lossy("Blog "), CampaignKind::Blog);
        assert_eq!(CampaignKind::parse_lossy("subhub"), CampaignKind::Subhub);
        assert_eq!(CampaignKind::parse_lossy("newsletter"), CampaignKind::Landing);
        assert_eq!(CampaignKind::parse_lossy(""), CampaignKind::Landing);
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("espresso-x"));
        assert!(is_valid_slug("a1"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-lead"));
        assert!(!is_valid_slug("double--dash"));
        assert!(!is_valid_slug("Upper"));
        assert!(!is_valid_slug("with space"));
    }

    #[test]
    fn test_reserved_categories_rejected() {
        assert!(is_valid_category("home"));
        assert!(is_valid_category("health-and-fitness"));
        for reserved in RESERVED_CATEGORIES {
            assert!(!is_valid_category(reserved));
        }

        let mut input = new_landing("widget");
        input.category = "health".to_string();
        assert!(matches!(input.into_campaign(), Err(CmsError::Validation(_))));

        let mut campaign = new_landing("widget").into_campaign().unwrap();
        let update = CampaignUpdate {
            category: Some("api".to_string()),
            ..Default::default()
        };
        assert!(matches!(update.apply(&mut campaign), Err(CmsError::Validation(_))));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Máquina de Café Expresso!"), "maquina-de-cafe-expresso");
        assert_eq!(slugify("  --Air Fryer 5L-- "), "air-fryer-5l");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_new_campaign_rejects_bad_input() {
        let mut input = new_landing("Bad Slug");
        assert!(matches!(input.clone().into_campaign(), Err(CmsError::Validation(_))));

        input.slug = "ok".to_string();
        input.product_name = "   ".to_string();
        assert!(matches!(input.into_campaign(), Err(CmsError::Validation(_))));
    }

    #[test]
    fn test_update_cannot_change_kind_without_content() {
        let mut campaign = new_landing("widget").into_campaign().unwrap();
        let update = CampaignUpdate {
            kind: Some(CampaignKind::Blog),
            ..Default::default()
        };
        assert!(update.apply(&mut campaign).is_err());
    }

    #[test]
    fn test_update_parent_double_option() {
        let update: CampaignUpdate = serde_json::from_value(json!({"parent_id": null})).unwrap();
        assert_eq!(update.parent_id, Some(None));

        let update: CampaignUpdate = serde_json::from_value(json!({})).unwrap();
        assert_eq!(update.parent_id, None);
    }
}
