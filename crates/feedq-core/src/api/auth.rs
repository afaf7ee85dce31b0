//! HTTP Basic authentication middleware.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::error::ApiError;
use super::state::ApiState;

/// Decode `Authorization: Basic <base64(user:pass)>` into its two halves.
pub fn parse_basic_credentials(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Middleware rejecting requests whose Basic credentials do not match the
/// configured username and password.
pub async fn require_basic_auth(
    State(state): State<ApiState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return ApiError::Unauthorized("Missing Authorization header".into()).into_response();
    };

    let Ok(value) = value.to_str() else {
        return ApiError::Unauthorized("Invalid Authorization header encoding".into())
            .into_response();
    };

    match parse_basic_credentials(value) {
        Some((user, pass)) if *user == *state.username && *pass == *state.password => {
            next.run(req).await
        }
        Some(_) => {
            tracing::warn!("Rejected request with invalid credentials");
            ApiError::Unauthorized("Invalid credentials".into()).into_response()
        }
        None => ApiError::Unauthorized("Expected Basic credentials".into()).into_response(),
    }
}
