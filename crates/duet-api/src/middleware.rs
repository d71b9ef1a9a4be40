use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use duet_types::api::Claims;

use crate::auth::{AUTH_COOKIE, AppState};
use crate::error::ApiError;

/// Extract and validate the session JWT from the auth cookie, injecting
/// `Claims` for downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(auth_cookie_value)
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized("session is invalid or expired".to_string()))?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

fn auth_cookie_value(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .find_map(|c| c.trim().strip_prefix(AUTH_COOKIE)?.strip_prefix('='))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_token_among_other_cookies() {
        let cookies = "theme=dark; auth-token=abc.def.ghi; lang=en";
        assert_eq!(auth_cookie_value(cookies), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn missing_token_is_none() {
        assert_eq!(auth_cookie_value("theme=dark"), None);
        assert_eq!(auth_cookie_value(""), None);
    }

    #[test]
    fn does_not_match_prefixed_cookie_names() {
        assert_eq!(auth_cookie_value("my-auth-token-ish=zzz"), None);
    }
}
