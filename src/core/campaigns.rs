//! Application-level campaign operations.
//!
//! Wraps the repository with the checks the schema cannot express:
//! parent validity, content shape, slug immutability.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::core::silo::SiloGraph;
use crate::core::CmsError;
use crate::domain::{Campaign, CampaignUpdate, NewCampaign};
use crate::store::CampaignRepository;

/// Campaign service shared by the HTTP handlers, CLI and pipelines
#[derive(Clone)]
pub struct CampaignService {
    repo: Arc<dyn CampaignRepository>,
    silo: SiloGraph,
}

impl CampaignService {
    pub fn new(repo: Arc<dyn CampaignRepository>) -> Self {
        let silo = SiloGraph::new(repo.clone());
        Self { repo, silo }
    }

    pub fn silo(&self) -> &SiloGraph {
        &self.silo
    }

    pub fn repository(&self) -> &Arc<dyn CampaignRepository> {
        &self.repo
    }

    #[instrument(skip(self, input), fields(slug = %input.slug, kind = %input.kind))]
    pub async fn create(&self, input: NewCampaign) -> Result<Campaign, CmsError> {
        let campaign = input.into_campaign()?;
        self.silo.validate_parent(campaign.parent_id, None).await?;
        self.repo.create(&campaign).await?;
        info!(id = %campaign.id, "Campaign created");
        Ok(campaign)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: CampaignUpdate) -> Result<Campaign, CmsError> {
        let mut campaign = self.get(id).await?;
        let parent_changed = update.parent_id.is_some();
        update.apply(&mut campaign)?;

        if parent_changed {
            self.silo.validate_parent(campaign.parent_id, Some(id)).await?;
        }
        // A hub turned into an article must not keep children
        if !campaign.kind.can_parent() && !self.repo.find_children_by_parent(id).await?.is_empty() {
            return Err(CmsError::validation(
                "Campaign has children and must stay a hub or sub-hub",
            ));
        }

        self.repo.update(&campaign).await?;
        info!(slug = %campaign.slug, "Campaign updated");
        Ok(campaign)
    }

    /// Delete by id. Children keep their dangling parent pointer.
    pub async fn delete(&self, id: Uuid) -> Result<(), CmsError> {
        if !self.repo.delete(id).await? {
            return Err(CmsError::NotFound(format!("campaign {}", id)));
        }
        info!(%id, "Campaign deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Campaign, CmsError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| CmsError::NotFound(format!("campaign {}", id)))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Campaign, CmsError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| CmsError::NotFound(format!("slug '{}'", slug)))
    }

    pub async fn list(&self) -> Result<Vec<Campaign>, CmsError> {
        self.repo.find_all().await
    }

    /// Published (non-draft) records
    pub async fn list_published(&self) -> Result<Vec<Campaign>, CmsError> {
        Ok(self
            .repo
            .find_all()
            .await?
            .into_iter()
            .filter(|c| !c.is_draft())
            .collect())
    }

    /// Delete drafts created before `cutoff`; returns the deleted slugs
    #[instrument(skip(self))]
    pub async fn purge_drafts(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, CmsError> {
        let mut purged = Vec::new();
        for campaign in self.repo.find_all().await? {
            if campaign.is_draft() && campaign.created_at < cutoff {
                self.repo.delete(campaign.id).await?;
                purged.push(campaign.slug);
            }
        }
        info!(count = purged.len(), "Purged drafts");
        Ok(purged)
    }
}
