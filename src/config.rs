//! Configuration for affilio.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (AFFILIO_HOME, AFFILIO_DB, AFFILIO_BIND,
//!    GEMINI_API_KEY, CRON_SECRET, ADMIN_TOKEN, SITE_URL)
//! 2. Config file (.affilio/config.yaml)
//! 3. Defaults (~/.affilio)
//!
//! Config file discovery:
//! - Searches current directory and parents for .affilio/config.yaml
//! - Relative paths in the config file are resolved against the
//!   `.affilio/` directory holding it

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::gemini::DEFAULT_BASE_URL;
use crate::core::{AutoPostSettings, RateLimitConfig};
use crate::domain::Language;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub site: Option<SiteConfig>,
    #[serde(default)]
    pub generation: Option<GenerationConfig>,
    #[serde(default)]
    pub cron: Option<CronConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .affilio/)
    pub home: Option<String>,
    /// SQLite database file (relative to .affilio/)
    pub database: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub base_url: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_family: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CronConfig {
    pub secret: Option<String>,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub topics: HashMap<String, Vec<String>>,
    pub language: Option<Language>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the state directory
    pub home: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Listen address
    pub bind: String,
    /// Public site settings
    pub site: SiteSettings,
    /// Generation provider settings
    pub generation: GenerationSettings,
    /// Scheduled endpoint settings
    pub cron: CronSettings,
    /// Bearer token for the admin API (admin disabled when unset)
    pub admin_token: Option<String>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Absolute origin used in sitemap, canonical links and JSON-LD
    pub base_url: String,
    pub name: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            name: "Affilio".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub api_key: String,
    pub base_url: String,
    pub model_family: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model_family: "gemini".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CronSettings {
    /// Shared secret expected in `?key=`; cron is disabled when unset
    pub secret: Option<String>,
    pub rate_limit: RateLimitConfig,
    pub autopost: AutoPostSettings,
}

impl ResolvedConfig {
    /// Defaults rooted at `home`, ignoring files and environment
    pub fn with_home(home: PathBuf) -> Self {
        Self {
            database: home.join("affilio.db"),
            home,
            bind: "127.0.0.1:3000".to_string(),
            site: SiteSettings::default(),
            generation: GenerationSettings::default(),
            cron: CronSettings::default(),
            admin_token: None,
            config_file: None,
        }
    }

    /// Site origin without trailing slash
    pub fn site_origin(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".affilio").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    non_blank(std::env::var(name).ok())
}

/// Blank secrets count as unset
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Merge a parsed config file over defaults
fn apply_file(config: &mut ResolvedConfig, file: ConfigFile, config_dir: &Path) {
    if let Some(ref home) = file.paths.home {
        config.home = resolve_path(config_dir, home);
        config.database = config.home.join("affilio.db");
    }
    if let Some(ref database) = file.paths.database {
        config.database = resolve_path(config_dir, database);
    }

    if let Some(server) = file.server {
        if let Some(bind) = server.bind {
            config.bind = bind;
        }
        config.admin_token = non_blank(server.admin_token).or(config.admin_token.take());
    }

    if let Some(site) = file.site {
        if let Some(base_url) = site.base_url {
            config.site.base_url = base_url;
        }
        if let Some(name) = site.name {
            config.site.name = name;
        }
    }

    if let Some(generation) = file.generation {
        if let Some(key) = non_blank(generation.api_key) {
            config.generation.api_key = key;
        }
        if let Some(base_url) = generation.base_url {
            config.generation.base_url = base_url;
        }
        if let Some(family) = generation.model_family {
            config.generation.model_family = family;
        }
    }

    if let Some(cron) = file.cron {
        config.cron.secret = non_blank(cron.secret).or(config.cron.secret.take());
        if let Some(rate_limit) = cron.rate_limit {
            config.cron.rate_limit = rate_limit;
        }
        if let Some(categories) = cron.categories {
            config.cron.autopost.categories = categories;
        }
        config.cron.autopost.topics.extend(cron.topics);
        if let Some(language) = cron.language {
            config.cron.autopost.language = language;
        }
    }
}

/// Environment overrides, applied last
fn apply_env(config: &mut ResolvedConfig) {
    if let Some(home) = env_var("AFFILIO_HOME") {
        config.home = PathBuf::from(home);
        config.database = config.home.join("affilio.db");
    }
    if let Some(db) = env_var("AFFILIO_DB") {
        config.database = PathBuf::from(db);
    }
    if let Some(bind) = env_var("AFFILIO_BIND") {
        config.bind = bind;
    }
    if let Some(key) = env_var("GEMINI_API_KEY") {
        config.generation.api_key = key;
    }
    if let Some(secret) = env_var("CRON_SECRET") {
        config.cron.secret = Some(secret);
    }
    if let Some(token) = env_var("ADMIN_TOKEN") {
        config.admin_token = Some(token);
    }
    if let Some(url) = env_var("SITE_URL") {
        config.site.base_url = url;
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".affilio");

    let mut config = ResolvedConfig::with_home(default_home);

    let config_file = find_config_file();
    if let Some(ref config_path) = config_file {
        let file = load_config_file(config_path)?;
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        apply_file(&mut config, file, config_dir);
    }
    config.config_file = config_file;

    apply_env(&mut config);
    Ok(config)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
