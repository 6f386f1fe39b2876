//! affilio - AI-assisted affiliate content site
//!
//! Generates landing pages, blog reviews and hub pages with a hosted
//! language model, stores them in SQLite and serves them as
//! server-rendered HTML with structured data.
//!
//! # Architecture
//!
//! Content is organised as a silo:
//! - Hubs and sub-hubs parent articles and landing pages
//! - Every record has one canonical URL, `/{category}/{slug}`
//! - Requests under the wrong category are redirected to it
//!
//! # Modules
//!
//! - `adapters`: Generation provider integrations (Gemini)
//! - `core`: Prompting, generation, silo relations, rate limiting
//! - `domain`: Data structures (Campaign, CampaignContent)
//! - `store`: Campaign repository and its SQLite implementation
//! - `render`: HTML pages, JSON-LD, sitemap
//! - `server`: axum router, cron endpoint, admin API
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Serve the site
//! affilio serve
//!
//! # Generate and store a hub page
//! affilio generate "Coffee machines" --kind hub_principal --category home --save
//!
//! # Clean up old auto-generated drafts
//! affilio purge-drafts --older-than-hours 48
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod server;
pub mod store;

// Re-export main types at crate root for convenience
pub use crate::core::{CampaignService, CmsError, ContentPipeline, GenerationClient, RateLimiter, SiloGraph};
pub use crate::domain::{Campaign, CampaignContent, CampaignKind, Language, NewCampaign};
pub use crate::server::{router, AppState};
pub use crate::store::{CampaignRepository, SqliteCampaignStore};
