//! HTTP server.
//!
//! All shared state is built once in [`AppState::new`] and handed to the
//! router; handlers never reach for globals.

pub mod admin;
pub mod cron;
pub mod error;
pub mod extract;
pub mod public;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::adapters::{GeminiProvider, GenerationProvider};
use crate::config::ResolvedConfig;
use crate::core::{AutoPoster, CampaignService, ContentPipeline, GenerationClient, RateLimiter};
use crate::render::Site;
use crate::store::{CampaignRepository, SqliteCampaignStore};

pub use error::ApiError;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub campaigns: CampaignService,
    pub pipeline: ContentPipeline,
    pub autoposter: AutoPoster,
    pub limiter: Arc<RateLimiter>,
    pub site: Arc<Site>,
    pub config: Arc<ResolvedConfig>,
}

impl AppState {
    pub fn new(
        config: ResolvedConfig,
        repo: Arc<dyn CampaignRepository>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        let campaigns = CampaignService::new(repo);
        let client = GenerationClient::new(provider, config.generation.model_family.clone());
        let pipeline = ContentPipeline::new(
            campaigns.clone(),
            client,
            config.generation.api_key.clone(),
        );
        let autoposter = AutoPoster::new(pipeline.clone(), config.cron.autopost.clone());
        let limiter = Arc::new(RateLimiter::new(config.cron.rate_limit.clone()));
        let site = Arc::new(Site::new(config.site.name.clone(), config.site_origin()));

        Self {
            campaigns,
            pipeline,
            autoposter,
            limiter,
            site,
            config: Arc::new(config),
        }
    }
}

/// Public pages, cron and the admin API
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route(
            "/campaigns",
            get(admin::list_campaigns).post(admin::create_campaign),
        )
        .route(
            "/campaigns/{id}",
            get(admin::get_campaign)
                .put(admin::update_campaign)
                .delete(admin::delete_campaign),
        )
        .route("/campaigns/{id}/children", get(admin::list_children))
        .route("/parents", get(admin::list_parents))
        .route("/generate", axum::routing::post(admin::generate))
        .route("/debug/models", get(admin::debug_models))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin,
        ));

    Router::new()
        .route("/", get(public::home))
        .route("/health", get(public::health))
        .route("/sitemap.xml", get(public::sitemap))
        .route("/robots.txt", get(public::robots))
        .route("/cron/auto-post", get(cron::auto_post))
        .nest("/api", admin)
        .route("/{category}", get(public::category))
        .route("/{category}/{slug}", get(public::campaign))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the store, start the limiter sweep and serve until shutdown
pub async fn serve(config: ResolvedConfig) -> Result<()> {
    let store = SqliteCampaignStore::open(&config.database)
        .with_context(|| format!("Failed to open database: {}", config.database.display()))?;
    let provider = GeminiProvider::new(config.generation.base_url.clone());

    if config.generation.api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; generation requests will fail");
    }
    if config.cron.secret.is_none() {
        tracing::warn!("CRON_SECRET is not set; /cron/auto-post rejects every request");
    }

    let bind = config.bind.clone();
    let state = AppState::new(config, Arc::new(store), Arc::new(provider));
    let _sweeper = state.limiter.clone().spawn_sweeper();

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!(%bind, "affilio listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
