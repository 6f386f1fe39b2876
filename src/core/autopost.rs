//! Scheduled auto-posting.
//!
//! Picks a category and a topic, runs the pipeline as a blog review and
//! stores the result as a draft for later human review.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::core::pipeline::{ContentPipeline, GenerateCampaign};
use crate::core::CmsError;
use crate::domain::{slugify, CampaignKind, Language, DRAFT_PREFIX};

/// What the cron run will generate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoPostChoice {
    pub category: String,
    pub trend: String,
}

/// Result reported back to the scheduler
#[derive(Debug, Clone, Serialize)]
pub struct AutoPostOutcome {
    pub created: String,
    pub trend: String,
    pub category: String,
}

/// Categories and topic seeds for automated posts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPostSettings {
    #[serde(default)]
    pub categories: Vec<String>,

    /// Topic seeds per category
    #[serde(default)]
    pub topics: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub language: Language,
}

impl Default for AutoPostSettings {
    fn default() -> Self {
        Self {
            categories: ["tech", "home", "beauty", "fitness"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            topics: HashMap::new(),
            language: Language::default(),
        }
    }
}

/// Runs one automated post
#[derive(Clone)]
pub struct AutoPoster {
    pipeline: ContentPipeline,
    settings: AutoPostSettings,
}

impl AutoPoster {
    pub fn new(pipeline: ContentPipeline, settings: AutoPostSettings) -> Self {
        Self { pipeline, settings }
    }

    /// Pick a random category and one of its topics
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<AutoPostChoice, CmsError> {
        let category = self
            .settings
            .categories
            .choose(&mut *rng)
            .ok_or_else(|| CmsError::validation("No categories configured for auto-posting"))?
            .clone();

        let trend = self
            .settings
            .topics
            .get(&category)
            .and_then(|topics| topics.choose(&mut *rng))
            .cloned()
            .unwrap_or_else(|| format!("best {} products this month", category.replace('-', " ")));

        Ok(AutoPostChoice { category, trend })
    }

    /// Generate and store a draft for `choice`
    #[instrument(skip(self), fields(category = %choice.category, trend = %choice.trend))]
    pub async fn run(&self, choice: AutoPostChoice) -> Result<AutoPostOutcome, CmsError> {
        let mut input = GenerateCampaign::new(choice.trend.clone(), CampaignKind::Blog, choice.category.clone());
        input.language = self.settings.language;
        input.slug = Some(draft_slug(&choice.trend));
        input.context = format!(
            "Trending topic in the '{}' category. Write a buying-guide style review.",
            choice.category
        );

        let campaign = self.pipeline.generate_and_save(input).await?;
        info!(slug = %campaign.slug, "Auto-post draft stored");

        Ok(AutoPostOutcome {
            created: campaign.slug,
            trend: choice.trend,
            category: choice.category,
        })
    }
}

/// `draft-{topic}-{8 hex}`
pub fn draft_slug(topic: &str) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let base = slugify(topic);
    if base.is_empty() {
        format!("{}{}", DRAFT_PREFIX, suffix)
    } else {
        format!("{}{}-{}", DRAFT_PREFIX, base, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{GenerationProvider, ModelInfo, ProviderError};
    use crate::core::campaigns::CampaignService;
    use crate::core::generation::GenerationClient;
    use crate::domain::is_valid_slug;
    use crate::store::SqliteCampaignStore;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    struct FixedProvider;

    #[async_trait]
    impl GenerationProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn list_models(&self, _api_key: &str) -> Result<Vec<ModelInfo>, ProviderError> {
            Ok(vec![ModelInfo::new("models/gemini-test", &["generateContent"])])
        }

        async fn generate_text(&self, _: &str, _: &str, _: &str) -> Result<String, ProviderError> {
            Ok(r#"{"intro": "Trending now", "sections": []}"#.to_string())
        }
    }

    fn poster(settings: AutoPostSettings) -> (AutoPoster, CampaignService) {
        let service = CampaignService::new(Arc::new(SqliteCampaignStore::open_in_memory().unwrap()));
        let client = GenerationClient::new(Arc::new(FixedProvider), "gemini");
        let pipeline = ContentPipeline::new(service.clone(), client, "key");
        (AutoPoster::new(pipeline, settings), service)
    }

    #[test]
    fn test_draft_slug_shape() {
        let slug = draft_slug("Robot Vacuums 2026");
        assert!(slug.starts_with("draft-robot-vacuums-2026-"));
        assert!(is_valid_slug(&slug));
        assert_eq!(slug.len(), "draft-robot-vacuums-2026-".len() + 8);
    }

    #[test]
    fn test_pick_uses_configured_topics() {
        let settings = AutoPostSettings {
            categories: vec!["home".to_string()],
            topics: HashMap::from([("home".to_string(), vec!["air fryers".to_string()])]),
            language: Language::EnUs,
        };
        let (poster, _) = poster(settings);
        let mut rng = StdRng::seed_from_u64(7);

        let choice = poster.pick(&mut rng).unwrap();
        assert_eq!(choice.category, "home");
        assert_eq!(choice.trend, "air fryers");
    }

    #[test]
    fn test_pick_without_categories_fails() {
        let settings = AutoPostSettings {
            categories: vec![],
            ..Default::default()
        };
        let (poster, _) = poster(settings);
        assert!(poster.pick(&mut StdRng::seed_from_u64(1)).is_err());
    }

    #[tokio::test]
    async fn test_run_stores_draft() {
        let (poster, service) = poster(AutoPostSettings::default());
        let choice = AutoPostChoice {
            category: "tech".to_string(),
            trend: "best tech products this month".to_string(),
        };

        let outcome = poster.run(choice).await.unwrap();
        assert_eq!(outcome.category, "tech");

        let stored = service.get_by_slug(&outcome.created).await.unwrap();
        assert!(stored.is_draft());
        assert_eq!(stored.kind, CampaignKind::Blog);
    }
}
