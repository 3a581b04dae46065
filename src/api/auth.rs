use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::errors::ApiError;
use super::AppState;

/// Require `Authorization: Bearer <TRIGGER_TOKEN>` when a trigger token is
/// configured; pass everything through otherwise.
pub async fn trigger_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.trigger_token.as_deref() {
        let auth_header = request.headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) if tokens_match(token, expected) => {}
            Some(_) => return Err(ApiError::Unauthorized("Invalid trigger token".into())),
            None => return Err(ApiError::Unauthorized("Missing Authorization header".into())),
        }
    }

    Ok(next.run(request).await)
}

/// Compare without an early exit on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    let mut diff = given.len() ^ expected.len();
    for (i, &b) in expected.iter().enumerate() {
        diff |= usize::from(b ^ given.get(i).copied().unwrap_or(0));
    }
    diff == 0
}
