//! Public pages, sitemap and robots.txt.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use super::{ApiError, AppState};
use crate::core::silo::RELATED_LIMIT;
use crate::core::{resolve_category_redirect, CmsError};
use crate::render::{self, CampaignPage};

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let records = state.campaigns.list_published().await?;
    Ok(Html(render::home_page(&state.site, &records).into_string()))
}

pub async fn category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Html<String>, ApiError> {
    let records: Vec<_> = state
        .campaigns
        .repository()
        .find_by_category(&category)
        .await?
        .into_iter()
        .filter(|c| !c.is_draft())
        .collect();

    if records.is_empty() {
        return Err(CmsError::NotFound(format!("category '{}'", category)).into());
    }
    Ok(Html(
        render::category_page(&state.site, &category, &records).into_string(),
    ))
}

/// Render a record, or redirect to its canonical category
pub async fn campaign(
    State(state): State<AppState>,
    Path((category, slug)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let record = state.campaigns.get_by_slug(&slug).await?;

    if let Some(target) = resolve_category_redirect(&category, &record) {
        debug!(from = %category, to = %target, "Canonical redirect");
        return Ok(Redirect::permanent(&target).into_response());
    }

    let silo = state.campaigns.silo();
    let children: Vec<_> = if record.kind.can_parent() {
        silo.children_of(record.id)
            .await?
            .into_iter()
            .filter(|c| !c.is_draft())
            .collect()
    } else {
        Vec::new()
    };
    let page = CampaignPage {
        breadcrumb: silo.breadcrumb(&record).await?,
        children,
        related: silo.related(&record, RELATED_LIMIT).await?,
    };

    Ok(Html(render::campaign_page(&state.site, &record, &page).into_string()).into_response())
}

pub async fn sitemap(State(state): State<AppState>) -> Result<Response, ApiError> {
    let records = state.campaigns.list().await?;
    let xml = render::sitemap_xml(&state.site.origin, &records);
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}

pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render::robots_txt(&state.site.origin),
    )
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
