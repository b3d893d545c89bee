use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::{AppError, AppState};

pub const DEBUG_KEY_HEADER: &str = "X-Debug-Key";

/// Middleware that requires `X-Debug-Key` to match the configured debug key
pub async fn require_debug_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected_key = state.config.debug_key.as_bytes();

    let provided_key = request
        .headers()
        .get(DEBUG_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Debug-Key header".to_string()))?;

    if expected_key.ct_eq(provided_key.as_bytes()).into() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Unauthorized debug endpoint access attempt");
        Err(AppError::Unauthorized("Invalid debug key".to_string()))
    }
}
