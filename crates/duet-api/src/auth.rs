use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::header, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

use duet_store::Store;
use duet_types::Participant;
use duet_types::api::{Claims, LoginRequest, SessionUser};

use crate::error::{ApiError, ok};
use crate::storage::MediaStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn Store>,
    pub media: MediaStore,
    pub jwt_secret: String,
    pub him_password: String,
    pub her_password: String,
    pub him_name: String,
    pub her_name: String,
}

impl AppStateInner {
    /// Match a passphrase against the two configured secrets.
    pub fn authenticate(&self, password: &str) -> Option<Participant> {
        if password == self.him_password {
            Some(Participant::Him)
        } else if password == self.her_password {
            Some(Participant::Her)
        } else {
            None
        }
    }

    pub fn display_name(&self, who: Participant) -> &str {
        match who {
            Participant::Him => &self.him_name,
            Participant::Her => &self.her_name,
        }
    }
}

pub(crate) const AUTH_COOKIE: &str = "auth-token";
const SESSION_DAYS: i64 = 30;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.password.is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }

    let who = state
        .authenticate(&req.password)
        .ok_or_else(|| ApiError::Unauthorized("that passphrase doesn't match".to_string()))?;

    let name = state.display_name(who).to_string();
    let token = create_token(&state.jwt_secret, who, &name)?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        ok(json!({ "user": SessionUser { id: who, name } })),
    ))
}

pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_cookie())],
        Json(json!({ "success": true, "message": "signed out" })),
    )
}

pub async fn verify(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    // The name stored in the token may lag a config change; re-resolve it.
    ok(json!({
        "user": SessionUser {
            id: claims.sub,
            name: state.display_name(claims.sub).to_string(),
        }
    }))
}

fn create_token(secret: &str, who: Participant, name: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: who,
        name: name.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Max-Age={}; Path=/",
        AUTH_COOKIE,
        token,
        SESSION_DAYS * 24 * 60 * 60
    )
}

fn clear_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Max-Age=0; Path=/", AUTH_COOKIE)
}
