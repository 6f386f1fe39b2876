//! Command-line interface for affilio.
//!
//! Provides commands for serving the site, generating campaigns,
//! inspecting and pruning stored records, and checking configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};

use crate::adapters::GeminiProvider;
use crate::config::{self, ResolvedConfig};
use crate::core::GenerateCampaign;
use crate::domain::{CampaignKind, Language};
use crate::render;
use crate::server::{self, AppState};
use crate::store::SqliteCampaignStore;

/// affilio - AI-assisted affiliate content site
#[derive(Parser, Debug)]
#[command(name = "affilio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Generate a campaign with the configured model
    Generate {
        /// Product or topic name
        product_name: String,

        /// Campaign type: landing, blog, hub_principal, subhub
        #[arg(short, long, default_value = "landing")]
        kind: CampaignKind,

        /// Category the record is published under
        #[arg(short, long)]
        category: String,

        /// Output language (pt-BR, en-US, es-ES)
        #[arg(short, long, default_value = "pt-BR")]
        language: Language,

        /// Extra context for the prompt
        #[arg(long, default_value = "")]
        context: String,

        /// Writing tone
        #[arg(long)]
        tone: Option<String>,

        /// Slug (defaults to the slugified product name)
        #[arg(long)]
        slug: Option<String>,

        /// Slug of the parent hub or sub-hub
        #[arg(long)]
        parent: Option<String>,

        /// Affiliate link for the CTA
        #[arg(long, default_value = "")]
        link: String,

        /// Do not offer existing records as link targets
        #[arg(long)]
        no_links: bool,

        /// Persist the result instead of printing it
        #[arg(long)]
        save: bool,
    },

    /// List stored campaigns
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Include drafts created by the cron endpoint
        #[arg(long)]
        drafts: bool,
    },

    /// Show one campaign as JSON
    Show {
        slug: String,
    },

    /// Delete a campaign
    Delete {
        slug: String,
    },

    /// Delete auto-generated drafts older than the given age
    PurgeDrafts {
        #[arg(long, default_value = "24")]
        older_than_hours: i64,
    },

    /// List the models visible to the configured API key
    Models,

    /// Print sitemap.xml to stdout
    Sitemap,

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?.clone();

        match self.command {
            Commands::Serve { bind } => {
                let mut cfg = cfg;
                if let Some(bind) = bind {
                    cfg.bind = bind;
                }
                server::serve(cfg).await
            }
            Commands::Generate {
                product_name,
                kind,
                category,
                language,
                context,
                tone,
                slug,
                parent,
                link,
                no_links,
                save,
            } => {
                let mut input = GenerateCampaign::new(product_name, kind, category);
                input.language = language;
                input.context = context;
                input.tone = tone;
                input.slug = slug;
                input.affiliate_link = link;
                input.suggest_links = !no_links;
                generate(cfg, input, parent, save).await
            }
            Commands::List { category, drafts } => {
                list_campaigns(cfg, category, drafts).await
            }
            Commands::Show { slug } => {
                show_campaign(cfg, &slug).await
            }
            Commands::Delete { slug } => {
                delete_campaign(cfg, &slug).await
            }
            Commands::PurgeDrafts { older_than_hours } => {
                purge_drafts(cfg, older_than_hours).await
            }
            Commands::Models => {
                list_models(cfg).await
            }
            Commands::Sitemap => {
                print_sitemap(cfg).await
            }
            Commands::Config => {
                show_config(&cfg)
            }
        }
    }
}

fn open_state(cfg: ResolvedConfig) -> Result<AppState> {
    let store = SqliteCampaignStore::open(&cfg.database)
        .with_context(|| format!("Failed to open database: {}", cfg.database.display()))?;
    let provider = GeminiProvider::new(cfg.generation.base_url.clone());
    Ok(AppState::new(cfg, Arc::new(store), Arc::new(provider)))
}

async fn generate(
    cfg: ResolvedConfig,
    mut input: GenerateCampaign,
    parent_slug: Option<String>,
    save: bool,
) -> Result<()> {
    let state = open_state(cfg)?;

    if let Some(slug) = parent_slug {
        let parent = state
            .campaigns
            .get_by_slug(&slug)
            .await
            .with_context(|| format!("Parent '{}' not found", slug))?;
        input.parent_id = Some(parent.id);
    }

    eprintln!("Generating {} '{}'...", input.kind, input.product_name);

    if save {
        let campaign = state.pipeline.generate_and_save(input).await?;
        eprintln!("\n[Saved {} at {}]", campaign.slug, campaign.canonical_path());
    } else {
        let generated = state.pipeline.generate(input).await?;
        println!("{}", serde_json::to_string_pretty(&generated)?);
        eprintln!("\n[Generated with {} - not saved]", generated.model);
    }

    Ok(())
}

async fn list_campaigns(cfg: ResolvedConfig, category: Option<String>, drafts: bool) -> Result<()> {
    let state = open_state(cfg)?;

    let records = match category {
        Some(ref category) => state.campaigns.repository().find_by_category(category).await?,
        None => state.campaigns.list().await?,
    };
    let records: Vec<_> = records.into_iter().filter(|c| drafts || !c.is_draft()).collect();

    if records.is_empty() {
        println!("No campaigns found");
        return Ok(());
    }

    println!("{:<40} {:<14} {:<16} {:<20}", "SLUG", "TYPE", "CATEGORY", "UPDATED");
    println!("{}", "-".repeat(92));
    for c in records {
        println!(
            "{:<40} {:<14} {:<16} {:<20}",
            c.slug,
            c.kind.as_str(),
            c.category,
            c.updated_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

async fn show_campaign(cfg: ResolvedConfig, slug: &str) -> Result<()> {
    let state = open_state(cfg)?;
    let campaign = state.campaigns.get_by_slug(slug).await?;
    println!("{}", serde_json::to_string_pretty(&campaign)?);
    Ok(())
}

async fn delete_campaign(cfg: ResolvedConfig, slug: &str) -> Result<()> {
    let state = open_state(cfg)?;
    let campaign = state.campaigns.get_by_slug(slug).await?;

    let children = state.campaigns.silo().children_of(campaign.id).await?;
    if !children.is_empty() {
        eprintln!("Warning: {} child record(s) will lose their breadcrumb", children.len());
    }

    state.campaigns.delete(campaign.id).await?;
    eprintln!("Deleted {}", slug);
    Ok(())
}

/// `now` minus the given number of hours, rejecting values chrono cannot represent
fn purge_cutoff(now: DateTime<Utc>, older_than_hours: i64) -> Result<DateTime<Utc>> {
    Duration::try_hours(older_than_hours.max(0))
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| anyhow::anyhow!("--older-than-hours {} is out of range", older_than_hours))
}

async fn purge_drafts(cfg: ResolvedConfig, older_than_hours: i64) -> Result<()> {
    let cutoff = purge_cutoff(Utc::now(), older_than_hours)?;
    let state = open_state(cfg)?;

    let purged = state.campaigns.purge_drafts(cutoff).await?;
    for slug in &purged {
        println!("{}", slug);
    }
    eprintln!("Purged {} draft(s)", purged.len());
    Ok(())
}

async fn list_models(cfg: ResolvedConfig) -> Result<()> {
    let state = open_state(cfg)?;
    let client = state.pipeline.client();
    let key = state.pipeline.api_key();

    let models = client.debug_connection(key).await?;
    for name in &models {
        println!("{}", name);
    }
    match client.select_model(key).await {
        Ok(selected) => eprintln!("\nSelected: {}", selected),
        Err(e) => eprintln!("\nNo model selected: {}", e),
    }
    Ok(())
}

async fn print_sitemap(cfg: ResolvedConfig) -> Result<()> {
    let state = open_state(cfg)?;
    let records = state.campaigns.list().await?;
    print!("{}", render::sitemap_xml(&state.site.origin, &records));
    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    let set = |present: bool| if present { "(set)" } else { "(not set)" };

    println!("affilio configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database.display());
    println!();
    println!("Server:");
    println!("  Bind:        {}", cfg.bind);
    println!("  Site URL:    {}", cfg.site.base_url);
    println!("  Site name:   {}", cfg.site.name);
    println!("  Admin token: {}", set(cfg.admin_token.is_some()));
    println!();
    println!("Generation:");
    println!("  Endpoint:     {}", cfg.generation.base_url);
    println!("  Model family: {}", cfg.generation.model_family);
    println!("  API key:      {}", set(!cfg.generation.api_key.is_empty()));
    println!();
    println!("Cron:");
    println!("  Secret:     {}", set(cfg.cron.secret.is_some()));
    println!(
        "  Rate limit: {} per {}s (sweep every {}s)",
        cfg.cron.rate_limit.max_requests,
        cfg.cron.rate_limit.window_seconds,
        cfg.cron.rate_limit.sweep_interval_seconds
    );
    println!("  Categories: {}", cfg.cron.autopost.categories.join(", "));

    Ok(())
}
