//! Hub / sub-hub / article relations.
//!
//! The silo is a parent pointer on each campaign. Only hubs and
//! sub-hubs can be parents; a pointer to a deleted parent is tolerated
//! and simply produces no breadcrumb.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::core::prompt::SiblingRef;
use crate::core::CmsError;
use crate::domain::{Campaign, CampaignKind};
use crate::store::CampaignRepository;

/// Upper bound on ancestor walks
const MAX_DEPTH: usize = 16;

/// Default number of related links shown under a page
pub const RELATED_LIMIT: usize = 6;

/// One breadcrumb step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub title: String,
    pub path: String,
}

impl Crumb {
    fn of(campaign: &Campaign) -> Self {
        Self {
            title: campaign.title.clone(),
            path: campaign.canonical_path(),
        }
    }
}

/// Canonical redirect target, if the requested category is not the stored one
pub fn resolve_category_redirect(requested_category: &str, record: &Campaign) -> Option<String> {
    if requested_category == record.category {
        None
    } else {
        Some(record.canonical_path())
    }
}

/// Silo relations over a repository
#[derive(Clone)]
pub struct SiloGraph {
    repo: Arc<dyn CampaignRepository>,
}

impl SiloGraph {
    pub fn new(repo: Arc<dyn CampaignRepository>) -> Self {
        Self { repo }
    }

    /// Hubs and sub-hubs, for a parent selector
    pub async fn list_available_parents(&self) -> Result<Vec<Campaign>, CmsError> {
        self.repo.find_by_kinds(&CampaignKind::parent_kinds()).await
    }

    /// Direct children, newest first
    pub async fn children_of(&self, parent_id: Uuid) -> Result<Vec<Campaign>, CmsError> {
        self.repo.find_children_by_parent(parent_id).await
    }

    /// Check that `parent_id` may parent the record `self_id`
    pub async fn validate_parent(
        &self,
        parent_id: Option<Uuid>,
        self_id: Option<Uuid>,
    ) -> Result<(), CmsError> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if Some(parent_id) == self_id {
            return Err(CmsError::validation("A campaign cannot be its own parent"));
        }

        let parent = self
            .repo
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| CmsError::validation(format!("Parent {} does not exist", parent_id)))?;

        if !parent.kind.can_parent() {
            return Err(CmsError::validation(format!(
                "Parent '{}' is a {} and cannot have children",
                parent.slug, parent.kind
            )));
        }

        // Refuse to close a loop through the ancestors of the new parent
        if let Some(self_id) = self_id {
            let mut cursor = parent.parent_id;
            let mut depth = 0;
            while let Some(id) = cursor {
                if id == self_id {
                    return Err(CmsError::validation("Parent assignment would create a cycle"));
                }
                depth += 1;
                if depth > MAX_DEPTH {
                    break;
                }
                cursor = self.repo.find_by_id(id).await?.and_then(|c| c.parent_id);
            }
        }

        Ok(())
    }

    /// Ancestors root-first, then the record itself.
    ///
    /// Any dangling parent pointer in the chain yields an empty breadcrumb.
    pub async fn breadcrumb(&self, record: &Campaign) -> Result<Vec<Crumb>, CmsError> {
        let mut trail = vec![Crumb::of(record)];
        let mut seen = HashSet::from([record.id]);
        let mut cursor = record.parent_id;

        while let Some(id) = cursor {
            if !seen.insert(id) || trail.len() > MAX_DEPTH {
                break;
            }
            match self.repo.find_by_id(id).await? {
                Some(parent) => {
                    cursor = parent.parent_id;
                    trail.push(Crumb::of(&parent));
                }
                None => {
                    debug!(slug = %record.slug, missing = %id, "Dangling parent, no breadcrumb");
                    return Ok(Vec::new());
                }
            }
        }

        trail.reverse();
        Ok(trail)
    }

    /// Related pages: siblings under the same parent, or the same
    /// category for parentless records
    pub async fn related(&self, record: &Campaign, limit: usize) -> Result<Vec<Campaign>, CmsError> {
        let pool = match record.parent_id {
            Some(parent_id) => self.repo.find_children_by_parent(parent_id).await?,
            None => self.repo.find_by_category(&record.category).await?,
        };

        Ok(pool
            .into_iter()
            .filter(|c| c.id != record.id && !c.is_draft())
            .take(limit)
            .collect())
    }

    /// Existing published records of a category, offered as link targets
    pub async fn siblings_for_linking(
        &self,
        category: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<SiblingRef>, CmsError> {
        let records = self.repo.find_by_category(category).await?;

        Ok(records
            .into_iter()
            .filter(|c| Some(c.id) != exclude && !c.is_draft())
            .map(|c| SiblingRef {
                slug: c.slug,
                title: c.title,
                category: c.category,
            })
            .collect())
    }
}
