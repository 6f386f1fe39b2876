//! HTTP mapping for [`CmsError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::core::CmsError;

/// Handler error rendered as `{"error": message}`
#[derive(Debug)]
pub struct ApiError(pub CmsError);

impl From<CmsError> for ApiError {
    fn from(err: CmsError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CmsError::Unauthorized => StatusCode::UNAUTHORIZED,
            CmsError::NotFound(_) => StatusCode::NOT_FOUND,
            CmsError::Conflict(_) => StatusCode::CONFLICT,
            CmsError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CmsError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            CmsError::InvalidCredential
            | CmsError::NoModelAvailable
            | CmsError::MalformedResponse(_)
            | CmsError::Provider(_) => StatusCode::BAD_GATEWAY,
            CmsError::CredentialMissing | CmsError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self.0, "Request failed");
        } else {
            warn!(%status, error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
