use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

use crate::{auth, AppState};

/// Extracts JWT token from either __session cookie (frontend) or Authorization header
fn extract_token_from_request(parts: &Parts) -> Option<String> {
    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix("__session=") {
                    return Some(value.to_string());
                }
            }
        }
    }

    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// The member on whose behalf a request acts. Every workflow decision
/// is attributed to this id.
#[derive(Debug, Clone, Copy)]
pub struct ActingMember {
    pub member_id: i32,
}

type AuthRejection = (StatusCode, axum::Json<serde_json::Value>);

fn unauthorized(message: String) -> AuthRejection {
    (StatusCode::UNAUTHORIZED, axum::Json(json!({ "error": message })))
}

impl FromRequestParts<Arc<AppState>> for ActingMember {
    type Rejection = AuthRejection;

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = extract_token_from_request(parts);
        let state = state.clone();

        async move {
            let token = token.ok_or_else(|| {
                unauthorized("Missing authentication: no __session cookie or Authorization header".to_string())
            })?;

            let claims = auth::validate_jwt(&token, &state.config.jwt_secret).map_err(|e| {
                tracing::debug!(error = %e, "Rejected member token");
                unauthorized(e)
            })?;

            let member_id = claims.member_id().map_err(unauthorized)?;

            tracing::debug!(member_id, "Acting member resolved");
            Ok(ActingMember { member_id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(name: header::HeaderName, value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(name, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_token_from_session_cookie() {
        let parts = parts_with(header::COOKIE, "theme=dark; __session=abc.def.ghi");
        assert_eq!(extract_token_from_request(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_bearer_header() {
        let parts = parts_with(header::AUTHORIZATION, "Bearer xyz");
        assert_eq!(extract_token_from_request(&parts).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        let parts = parts_with(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert!(extract_token_from_request(&parts).is_none());
    }
}
