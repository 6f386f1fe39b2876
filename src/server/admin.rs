//! Admin JSON API under `/api`, guarded by a bearer token.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use super::{ApiError, AppState};
use crate::core::{CmsError, GenerateCampaign};
use crate::domain::{Campaign, CampaignUpdate, NewCampaign};

/// Reject requests without `Authorization: Bearer <admin token>`.
///
/// With no token configured the admin API is closed.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = match state.config.admin_token.as_deref() {
        Some(expected) if !expected.trim().is_empty() => request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token.trim() == expected),
        _ => false,
    };

    if !authorized {
        return ApiError(CmsError::Unauthorized).into_response();
    }
    next.run(request).await
}

pub async fn list_campaigns(State(state): State<AppState>) -> Result<Json<Vec<Campaign>>, ApiError> {
    Ok(Json(state.campaigns.list().await?))
}

pub async fn create_campaign(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let campaign = state.campaigns.create(input).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    Ok(Json(state.campaigns.get(id).await?))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<CampaignUpdate>,
) -> Result<Json<Campaign>, ApiError> {
    Ok(Json(state.campaigns.update(id, update).await?))
}

pub async fn delete_campaign(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.campaigns.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Hubs and sub-hubs for the parent selector
pub async fn list_parents(State(state): State<AppState>) -> Result<Json<Vec<Campaign>>, ApiError> {
    Ok(Json(state.campaigns.silo().list_available_parents().await?))
}

pub async fn list_children(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Campaign>>, ApiError> {
    let parent = state.campaigns.get(id).await?;
    Ok(Json(state.campaigns.silo().children_of(parent.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub input: GenerateCampaign,
    /// Persist the draft instead of only returning it
    #[serde(default)]
    pub save: bool,
}

pub async fn generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> Result<Response, ApiError> {
    if request.save {
        let campaign = state.pipeline.generate_and_save(request.input).await?;
        Ok((StatusCode::CREATED, Json(campaign)).into_response())
    } else {
        let generated = state.pipeline.generate(request.input).await?;
        Ok(Json(generated).into_response())
    }
}

/// Connection diagnostics: visible models and the one that would be used
pub async fn debug_models(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let client = state.pipeline.client();
    let models = client.debug_connection(state.pipeline.api_key()).await?;
    let selected = client.select_model(state.pipeline.api_key()).await.ok();

    Ok(Json(json!({
        "provider": client.provider_name(),
        "models": models,
        "selected": selected,
    })))
}
