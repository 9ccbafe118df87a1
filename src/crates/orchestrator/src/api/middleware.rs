//! API key authentication middleware.

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Require a matching `X-API-Key` header on task endpoints.
///
/// When no key is configured, the requirement is disabled.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_api_key(
        &state.settings.api_key,
        request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok()),
    )?;

    Ok(next.run(request).await)
}

/// Core key check, separated for testability.
pub(crate) fn check_api_key(configured: &str, provided: Option<&str>) -> Result<(), ApiError> {
    if configured.is_empty() {
        return Ok(());
    }

    match provided {
        None => Err(ApiError::Unauthorized(
            "API key is required. Please provide the X-API-Key header.".to_string(),
        )),
        Some(key) if key != configured => {
            Err(ApiError::Unauthorized("Invalid API key".to_string()))
        }
        Some(_) => Ok(()),
    }
}
