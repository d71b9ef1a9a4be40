use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use duet_types::api::{AddCommentRequest, Claims, CommentView, UpdateCommentRequest};
use duet_types::models::Comment;

use crate::auth::AppState;
use crate::error::{ApiError, blocking, ok};

/// Nesting level per comment: 0 for top-level, parent's level + 1 otherwise.
/// Comments arrive oldest-first, so a parent is always seen before its
/// replies; a missing parent falls back to 0.
fn with_levels(comments: Vec<Comment>) -> Vec<CommentView> {
    let mut levels: HashMap<Uuid, u32> = HashMap::with_capacity(comments.len());
    comments
        .into_iter()
        .map(|comment| {
            let level = comment
                .parent_comment_id
                .and_then(|p| levels.get(&p))
                .map_or(0, |parent_level| parent_level + 1);
            levels.insert(comment.id, level);
            CommentView { comment, level }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub memory_id: Uuid,
}

/// GET /api/memories/comments?memory_id=...
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<CommentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let comments = blocking(move || {
        if store.memory(query.memory_id)?.is_none() {
            return Err(ApiError::NotFound("memory not found".to_string()));
        }
        Ok(store.list_comments(query.memory_id)?)
    })
    .await?;

    Ok(ok(with_levels(comments)))
}

/// POST /api/memories/comments — add a comment, optionally replying to
/// another comment on the same memory.
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("comment cannot be empty".to_string()));
    }

    let now = Utc::now();
    let comment = Comment {
        id: Uuid::new_v4(),
        memory_id: req.memory_id,
        user_id: claims.sub,
        content,
        parent_comment_id: req.parent_comment_id,
        created_at: now,
        updated_at: now,
    };

    let store = state.store.clone();
    let stored = comment.clone();
    blocking(move || {
        if store.memory(stored.memory_id)?.is_none() {
            return Err(ApiError::NotFound("memory not found".to_string()));
        }
        if let Some(parent_id) = stored.parent_comment_id {
            let parent = store.comment(parent_id)?.ok_or_else(|| {
                ApiError::Validation("parent comment does not exist".to_string())
            })?;
            if parent.memory_id != stored.memory_id {
                return Err(ApiError::Validation(
                    "parent comment belongs to a different memory".to_string(),
                ));
            }
        }
        store.insert_comment(&stored)?;
        Ok(())
    })
    .await?;

    Ok(ok(json!({ "comment": comment })))
}

/// PUT /api/memories/comments — edit your own comment.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("comment cannot be empty".to_string()));
    }

    let user = claims.sub;
    let store = state.store.clone();
    let updated = blocking(move || {
        let existing = store
            .comment(req.comment_id)?
            .ok_or_else(|| ApiError::NotFound("comment not found".to_string()))?;
        if existing.user_id != user {
            return Err(ApiError::Permission(
                "you can only edit your own comments".to_string(),
            ));
        }
        store.update_comment(req.comment_id, user, &content, Utc::now())?;
        store
            .comment(req.comment_id)?
            .ok_or_else(|| ApiError::NotFound("comment not found".to_string()))
    })
    .await?;

    Ok(ok(json!({ "comment": updated })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommentQuery {
    pub comment_id: Uuid,
}

/// DELETE /api/memories/comments?comment_id=... — delete your own comment
/// along with its replies.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<DeleteCommentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user = claims.sub;
    let store = state.store.clone();
    blocking(move || {
        let existing = store
            .comment(query.comment_id)?
            .ok_or_else(|| ApiError::NotFound("comment not found".to_string()))?;
        if existing.user_id != user {
            return Err(ApiError::Permission(
                "you can only delete your own comments".to_string(),
            ));
        }
        store.delete_comment(query.comment_id, user)?;
        Ok(())
    })
    .await?;

    Ok(ok(json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use duet_types::Participant;

    fn comment(id: Uuid, parent: Option<Uuid>, minute: u32) -> Comment {
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 12, minute, 0).unwrap();
        Comment {
            id,
            memory_id: Uuid::nil(),
            user_id: Participant::Him,
            content: "x".to_string(),
            parent_comment_id: parent,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn levels_follow_parent_depth() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let d = Uuid::new_v4();
        let views = with_levels(vec![
            comment(a, None, 0),
            comment(b, Some(a), 1),
            comment(c, Some(b), 2),
            comment(d, None, 3),
        ]);
        let levels: Vec<u32> = views.iter().map(|v| v.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 0]);
    }

    #[test]
    fn missing_parent_falls_back_to_top_level() {
        let views = with_levels(vec![comment(Uuid::new_v4(), Some(Uuid::new_v4()), 0)]);
        assert_eq!(views[0].level, 0);
    }
}
