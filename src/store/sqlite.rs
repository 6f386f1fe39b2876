//! SQLite campaign store.
//!
//! One connection behind a mutex; every statement runs on the blocking
//! pool. Timestamps are stored as RFC 3339 text, gallery images and
//! content as JSON text.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

use super::CampaignRepository;
use crate::core::CmsError;
use crate::domain::{Campaign, CampaignContent, CampaignKind, Language};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS campaigns (
    id             TEXT PRIMARY KEY,
    slug           TEXT NOT NULL UNIQUE,
    kind           TEXT NOT NULL,
    category       TEXT NOT NULL,
    language       TEXT NOT NULL,
    product_name   TEXT NOT NULL,
    title          TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    affiliate_link TEXT NOT NULL DEFAULT '',
    image_url      TEXT NOT NULL DEFAULT '',
    gallery_images TEXT NOT NULL DEFAULT '[]',
    content        TEXT NOT NULL DEFAULT '{}',
    parent_id      TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_campaigns_category ON campaigns(category);
CREATE INDEX IF NOT EXISTS idx_campaigns_parent ON campaigns(parent_id);
"#;

const COLUMNS: &str = "id, slug, kind, category, language, product_name, title, description, \
     affiliate_link, image_url, gallery_images, content, parent_id, created_at, updated_at";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

/// Campaign repository backed by SQLite
pub struct SqliteCampaignStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCampaignStore {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self, CmsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CmsError::Storage(format!("{}: {}", parent.display(), e)))?;
            }
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened campaign database");
        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, CmsError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CmsError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection without blocking a runtime worker
    async fn with_conn<T, F>(&self, f: F) -> Result<T, CmsError>
    where
        F: FnOnce(&Connection) -> Result<T, CmsError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&guard)
        })
        .await
        .map_err(|e| CmsError::Storage(format!("database task failed: {}", e)))?
    }

    async fn query_list(&self, filter: String, args: Vec<String>) -> Result<Vec<Campaign>, CmsError> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM campaigns {} {}", COLUMNS, filter, NEWEST_FIRST);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(args.iter()), StoredRow::from_row)?;

            let mut campaigns = Vec::new();
            for row in rows {
                campaigns.push(row?.into_campaign()?);
            }
            Ok(campaigns)
        })
        .await
    }

    async fn query_one(&self, filter: &'static str, arg: String) -> Result<Option<Campaign>, CmsError> {
        self.with_conn(move |conn| {
            let sql = format!("SELECT {} FROM campaigns {}", COLUMNS, filter);
            let row = conn
                .query_row(&sql, params![arg], StoredRow::from_row)
                .optional()?;
            row.map(StoredRow::into_campaign).transpose()
        })
        .await
    }
}

/// Raw column values, converted to a `Campaign` outside the row closure
struct StoredRow {
    id: String,
    slug: String,
    kind: String,
    category: String,
    language: String,
    product_name: String,
    title: String,
    description: String,
    affiliate_link: String,
    image_url: String,
    gallery_images: String,
    content: String,
    parent_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            slug: row.get(1)?,
            kind: row.get(2)?,
            category: row.get(3)?,
            language: row.get(4)?,
            product_name: row.get(5)?,
            title: row.get(6)?,
            description: row.get(7)?,
            affiliate_link: row.get(8)?,
            image_url: row.get(9)?,
            gallery_images: row.get(10)?,
            content: row.get(11)?,
            parent_id: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    fn into_campaign(self) -> Result<Campaign, CmsError> {
        let kind: CampaignKind = self
            .kind
            .parse()
            .map_err(|e: CmsError| CmsError::Storage(e.to_string()))?;
        let language: Language = self.language.parse().unwrap_or_default();

        Ok(Campaign {
            id: parse_uuid(&self.id)?,
            content: CampaignContent::from_stored(kind, &self.content),
            gallery_images: serde_json::from_str(&self.gallery_images).unwrap_or_default(),
            parent_id: self.parent_id.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
            slug: self.slug,
            kind,
            category: self.category,
            language,
            product_name: self.product_name,
            title: self.title,
            description: self.description,
            affiliate_link: self.affiliate_link,
            image_url: self.image_url,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, CmsError> {
    Uuid::parse_str(s).map_err(|e| CmsError::Storage(format!("bad id '{}': {}", s, e)))
}

/// Fixed-width so text ordering matches time ordering
fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, CmsError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| CmsError::Storage(format!("bad timestamp '{}': {}", s, e)))
}

#[async_trait]
impl CampaignRepository for SqliteCampaignStore {
    async fn create(&self, c: &Campaign) -> Result<(), CmsError> {
        let gallery = serde_json::to_string(&c.gallery_images)?;
        let content = serde_json::to_string(&c.content)?;
        let c = c.clone();

        self.with_conn(move |conn| {
            let result = conn.execute(
                &format!(
                    "INSERT INTO campaigns ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    COLUMNS
                ),
                params![
                    c.id.to_string(),
                    c.slug,
                    c.kind.as_str(),
                    c.category,
                    c.language.code(),
                    c.product_name,
                    c.title,
                    c.description,
                    c.affiliate_link,
                    c.image_url,
                    gallery,
                    content,
                    c.parent_id.map(|p| p.to_string()),
                    format_time(&c.created_at),
                    format_time(&c.updated_at),
                ],
            );

            match result {
                Ok(_) => {
                    debug!(slug = %c.slug, "Inserted campaign");
                    Ok(())
                }
                Err(e) => match CmsError::from(e) {
                    CmsError::Conflict(_) => Err(CmsError::Conflict(format!(
                        "slug '{}' already exists",
                        c.slug
                    ))),
                    other => Err(other),
                },
            }
        })
        .await
    }

    async fn update(&self, c: &Campaign) -> Result<(), CmsError> {
        let gallery = serde_json::to_string(&c.gallery_images)?;
        let content = serde_json::to_string(&c.content)?;
        let c = c.clone();

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE campaigns SET kind = ?2, category = ?3, language = ?4, product_name = ?5, \
                 title = ?6, description = ?7, affiliate_link = ?8, image_url = ?9, \
                 gallery_images = ?10, content = ?11, parent_id = ?12, updated_at = ?13 \
                 WHERE id = ?1",
                params![
                    c.id.to_string(),
                    c.kind.as_str(),
                    c.category,
                    c.language.code(),
                    c.product_name,
                    c.title,
                    c.description,
                    c.affiliate_link,
                    c.image_url,
                    gallery,
                    content,
                    c.parent_id.map(|p| p.to_string()),
                    format_time(&c.updated_at),
                ],
            )?;

            if changed == 0 {
                return Err(CmsError::NotFound(format!("campaign {}", c.id)));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CmsError> {
        self.with_conn(move |conn| {
            let changed =
                conn.execute("DELETE FROM campaigns WHERE id = ?1", params![id.to_string()])?;
            Ok(changed > 0)
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Campaign>, CmsError> {
        self.query_one("WHERE id = ?1", id.to_string()).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Campaign>, CmsError> {
        self.query_one("WHERE slug = ?1", slug.to_string()).await
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Campaign>, CmsError> {
        self.query_list("WHERE category = ?1".to_string(), vec![category.to_string()])
            .await
    }

    async fn find_all(&self) -> Result<Vec<Campaign>, CmsError> {
        self.query_list(String::new(), Vec::new()).await
    }

    async fn find_children_by_parent(&self, parent_id: Uuid) -> Result<Vec<Campaign>, CmsError> {
        self.query_list("WHERE parent_id = ?1".to_string(), vec![parent_id.to_string()])
            .await
    }

    async fn find_by_kinds(&self, kinds: &[CampaignKind]) -> Result<Vec<Campaign>, CmsError> {
        if kinds.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders: Vec<String> = (1..=kinds.len()).map(|i| format!("?{}", i)).collect();
        let names = kinds.iter().map(|k| k.as_str().to_string()).collect();

        self.query_list(format!("WHERE kind IN ({})", placeholders.join(", ")), names)
            .await
    }
}
