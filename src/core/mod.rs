//! Core content logic.
//!
//! This module contains:
//! - Prompt: prompt construction for generation
//! - Generation: model selection and strict JSON decoding
//! - Silo: hub/sub-hub/article relations and canonical redirects
//! - RateLimit: fixed-window limiter for the cron endpoint
//! - Campaigns: validated campaign operations
//! - Pipeline / AutoPost: generation flows used by the admin API and cron

pub mod autopost;
pub mod campaigns;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod rate_limit;
pub mod silo;

// Re-export commonly used types
pub use autopost::{AutoPostChoice, AutoPostOutcome, AutoPostSettings, AutoPoster};
pub use campaigns::CampaignService;
pub use error::CmsError;
pub use generation::{parse_generated_json, strip_code_fences, GenerationClient};
pub use pipeline::{ContentPipeline, GenerateCampaign, GeneratedCampaign};
pub use prompt::{build_prompt, ContentRequest, PromptKind, SiblingRef};
pub use rate_limit::{client_identifier, RateLimitConfig, RateLimitDecision, RateLimiter};
pub use silo::{resolve_category_redirect, Crumb, SiloGraph};
