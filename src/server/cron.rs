//! `GET /cron/auto-post?key=<secret>`

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::core::{client_identifier, CmsError, RateLimitDecision};

#[derive(Debug, Deserialize)]
pub struct CronQuery {
    pub key: Option<String>,
}

fn rate_limit_headers(decision: &RateLimitDecision) -> [(&'static str, String); 3] {
    [
        ("x-ratelimit-limit", decision.limit.to_string()),
        ("x-ratelimit-remaining", decision.remaining.to_string()),
        ("x-ratelimit-reset", decision.reset_at.timestamp().to_string()),
    ]
}

/// Key check, then rate limit, then one generated draft.
///
/// A rejected request never reaches the generation provider.
pub async fn auto_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> Response {
    let authorized = match (state.config.cron.secret.as_deref(), query.key.as_deref()) {
        (Some(secret), Some(key)) => !secret.trim().is_empty() && secret == key,
        _ => false,
    };
    if !authorized {
        warn!("Cron request with missing or wrong key");
        return ApiError(CmsError::Unauthorized).into_response();
    }

    let client = client_identifier(
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok()),
    );
    let decision = state.limiter.check(&client);
    let limit_headers = rate_limit_headers(&decision);
    if !decision.allowed {
        warn!(%client, "Cron request rate limited");
        return (limit_headers, ApiError(CmsError::RateLimited)).into_response();
    }

    // ThreadRng is !Send; keep it out of the await below
    let choice = {
        let mut rng = rand::thread_rng();
        state.autoposter.pick(&mut rng)
    };

    let result = match choice {
        Ok(choice) => state.autoposter.run(choice).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            info!(created = %outcome.created, %client, "Cron auto-post complete");
            (
                limit_headers,
                Json(json!({
                    "success": true,
                    "created": outcome.created,
                    "trend": outcome.trend,
                    "category": outcome.category,
                    "rateLimitRemaining": decision.remaining,
                })),
            )
                .into_response()
        }
        Err(e) => (limit_headers, ApiError(e)).into_response(),
    }
}
