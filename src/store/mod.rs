//! Persistence boundary for campaigns.
//!
//! Core code only sees [`CampaignRepository`]; the SQLite implementation
//! lives in [`sqlite`].

pub mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::CmsError;
use crate::domain::{Campaign, CampaignKind};

pub use sqlite::SqliteCampaignStore;

/// Campaign storage operations
///
/// Listing methods return newest records first.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Insert a new record; a taken slug is a `Conflict`
    async fn create(&self, campaign: &Campaign) -> Result<(), CmsError>;

    /// Overwrite every mutable column of an existing record
    async fn update(&self, campaign: &Campaign) -> Result<(), CmsError>;

    /// Delete by id; returns whether a record was removed
    async fn delete(&self, id: Uuid) -> Result<bool, CmsError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, CmsError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Campaign>, CmsError>;

    async fn find_by_category(&self, category: &str) -> Result<Vec<Campaign>, CmsError>;

    async fn find_all(&self) -> Result<Vec<Campaign>, CmsError>;

    async fn find_children_by_parent(&self, parent_id: Uuid) -> Result<Vec<Campaign>, CmsError>;

    async fn find_by_kinds(&self, kinds: &[CampaignKind]) -> Result<Vec<Campaign>, CmsError>;
}
