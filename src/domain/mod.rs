//! Domain types for affilio.
//!
//! - Campaign: the persisted record and its input/update shapes
//! - Content: typed generated copy, one shape per campaign kind

pub mod campaign;
pub mod content;

pub use campaign::{
    is_valid_category, is_valid_slug, slugify, Campaign, CampaignKind, CampaignUpdate, Language,
    NewCampaign, DRAFT_PREFIX, RESERVED_CATEGORIES,
};
pub use content::{
    BlogContent, CampaignContent, FaqEntry, Feature, HubContent, InternalLink, LandingContent,
    Section, MAX_RATING,
};
