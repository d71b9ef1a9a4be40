use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use duet_types::Participant;
use duet_types::api::{Claims, ToggleLikeRequest};
use duet_types::models::Like;

use crate::auth::AppState;
use crate::error::{ApiError, blocking, ok};

fn like_summary(likes: &[Like]) -> serde_json::Value {
    json!({
        "like_count": likes.len(),
        "liked_by_him": likes.iter().any(|l| l.user_id == Participant::Him),
        "liked_by_her": likes.iter().any(|l| l.user_id == Participant::Her),
    })
}

#[derive(Debug, Deserialize)]
pub struct LikesQuery {
    pub memory_id: Uuid,
}

/// GET /api/memories/likes?memory_id=...
pub async fn get_likes(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<LikesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let likes = blocking(move || {
        if store.memory(query.memory_id)?.is_none() {
            return Err(ApiError::NotFound("memory not found".to_string()));
        }
        Ok(store.likes_for_memory(query.memory_id)?)
    })
    .await?;

    let mut data = like_summary(&likes);
    data["likes"] = json!(likes);
    Ok(ok(data))
}

/// POST /api/memories/likes — toggle the current user's like. Identity
/// comes from the session, never from the body.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ToggleLikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = claims.sub;
    let store = state.store.clone();
    let (added, likes) = blocking(move || {
        if store.memory(req.memory_id)?.is_none() {
            return Err(ApiError::NotFound("memory not found".to_string()));
        }
        let added = store.toggle_like(Uuid::new_v4(), req.memory_id, user, Utc::now())?;
        Ok((added, store.likes_for_memory(req.memory_id)?))
    })
    .await?;

    let mut data = like_summary(&likes);
    data["liked"] = json!(added);
    Ok(ok(data))
}
