use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use duet_types::api::{Claims, CountdownEventRequest};
use duet_types::models::CountdownEvent;

use crate::auth::AppState;
use crate::error::{ApiError, blocking, ok, ok_with_message};

const MAX_TITLE_CHARS: usize = 50;
/// At most this many events may still be in the future at once.
const MAX_FUTURE_EVENTS: u64 = 5;

fn validated_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("event needs a title".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::Validation(format!(
            "title cannot exceed {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title)
}

/// GET /api/countdown — all events split into upcoming and past.
pub async fn list_events(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let events = blocking(move || Ok(store.list_countdowns()?)).await?;

    let now = Utc::now();
    let total = events.len();
    let (active, expired): (Vec<CountdownEvent>, Vec<CountdownEvent>) =
        events.into_iter().partition(|e| e.target_date > now);
    let has_active = !active.is_empty();

    Ok(ok(json!({
        "activeEvents": active,
        "expiredEvents": expired,
        "totalEvents": total,
        "hasActiveEvents": has_active,
    })))
}

/// POST /api/countdown
pub async fn create_event(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Json(req): Json<CountdownEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validated_title(&req.title)?;
    let now = Utc::now();
    if req.target_date <= now {
        return Err(ApiError::Validation(
            "the big day has to be in the future".to_string(),
        ));
    }

    let event = CountdownEvent {
        id: Uuid::new_v4(),
        title,
        target_date: req.target_date,
        background_image_url: req.background_image_url,
        created_at: now,
        updated_at: now,
    };

    let store = state.store.clone();
    let stored = event.clone();
    blocking(move || {
        if store.count_future_countdowns(now)? >= MAX_FUTURE_EVENTS {
            return Err(ApiError::Validation(format!(
                "you can only have {} upcoming events at a time",
                MAX_FUTURE_EVENTS
            )));
        }
        store.insert_countdown(&stored)?;
        Ok(())
    })
    .await?;

    Ok(ok_with_message(json!({ "event": event }), "event created"))
}

/// DELETE /api/countdown — clear the whole list.
pub async fn delete_all_events(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let removed = blocking(move || Ok(store.delete_all_countdowns()?)).await?;
    Ok(ok(json!({ "deletedCount": removed })))
}

/// GET /api/countdown/{id}
pub async fn get_event(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let event = blocking(move || {
        store
            .countdown(id)?
            .ok_or_else(|| ApiError::NotFound("event not found".to_string()))
    })
    .await?;
    Ok(ok(json!({ "event": event })))
}

/// PUT /api/countdown/{id}
pub async fn update_event(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CountdownEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = validated_title(&req.title)?;
    let now = Utc::now();
    if req.target_date <= now {
        return Err(ApiError::Validation(
            "the big day has to be in the future".to_string(),
        ));
    }

    let store = state.store.clone();
    let event = blocking(move || {
        let matched = store.update_countdown(
            id,
            &title,
            req.target_date,
            req.background_image_url.as_deref(),
            now,
        )?;
        if !matched {
            return Err(ApiError::NotFound("event not found".to_string()));
        }
        store
            .countdown(id)?
            .ok_or_else(|| ApiError::NotFound("event not found".to_string()))
    })
    .await?;

    Ok(ok_with_message(json!({ "event": event }), "event updated"))
}

/// DELETE /api/countdown/{id} — idempotent, an already-gone event
/// still reports success.
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let removed = blocking(move || Ok(store.delete_countdown(id)?)).await?;
    Ok(ok(json!({ "deleted": removed })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed_and_bounded() {
        assert_eq!(validated_title("  our trip  ").unwrap(), "our trip");
        assert!(validated_title("   ").is_err());
        assert!(validated_title(&"x".repeat(51)).is_err());
        assert!(validated_title(&"x".repeat(50)).is_ok());
    }
}
