use axum::{
    Extension,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use duet_types::api::{Claims, VoiceMessageView};
use duet_types::models::{MediaObject, VoiceMessage};

use crate::auth::AppState;
use crate::error::{ApiError, blocking, ok, ok_with_message};

fn view(state: &AppState, msg: VoiceMessage) -> VoiceMessageView {
    let sender_name = state.display_name(msg.sender_id).to_string();
    let recipient_name = state.display_name(msg.recipient_id).to_string();
    VoiceMessageView::new(msg, &sender_name, &recipient_name)
}

/// GET /api/voice-messages — every clip either of us has sent, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let messages = blocking(move || Ok(store.list_voice_messages()?)).await?;

    let views: Vec<VoiceMessageView> = messages.into_iter().map(|m| view(&state, m)).collect();
    Ok(ok(json!({ "messages": views })))
}

/// POST /api/voice-messages — multipart `audio` + `duration`. The recipient
/// is always the other half.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut audio: Option<(String, Vec<u8>)> = None;
    let mut duration: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("audio") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read upload: {}", e)))?;
                audio = Some((content_type, bytes.to_vec()));
            }
            Some("duration") => {
                duration = Some(field.text().await.map_err(|e| {
                    ApiError::Validation(format!("failed to read duration: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (content_type, bytes) =
        audio.ok_or_else(|| ApiError::Validation("no recording attached".to_string()))?;
    if !content_type.starts_with("audio/") {
        return Err(ApiError::Validation(
            "only audio recordings are accepted".to_string(),
        ));
    }
    let duration: f64 = duration
        .as_deref()
        .and_then(|d| d.trim().parse().ok())
        .filter(|d: &f64| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ApiError::Validation("invalid recording duration".to_string()))?;

    let now = Utc::now();
    let media = MediaObject {
        id: Uuid::new_v4(),
        owner_id: claims.sub,
        content_type,
        size_bytes: bytes.len() as u64,
        created_at: now,
    };
    let message = VoiceMessage {
        id: Uuid::new_v4(),
        sender_id: claims.sub,
        recipient_id: claims.sub.other(),
        audio_url: format!("/media/{}", media.id),
        duration,
        is_read: false,
        created_at: now,
    };

    state
        .media
        .save(media.id, &bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let store = state.store.clone();
    let media_id = media.id;
    let stored = message.clone();
    let inserted = blocking(move || {
        store.insert_media(&media)?;
        store.insert_voice_message(&stored)?;
        Ok(())
    })
    .await;

    if let Err(e) = inserted {
        state.media.remove(media_id).await;
        return Err(e);
    }

    Ok(ok_with_message(
        json!({ "message": view(&state, message) }),
        "voice message sent",
    ))
}

/// PATCH /api/voice-messages/{id} — the recipient marks a clip as heard.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = claims.sub;
    let store = state.store.clone();
    let message = blocking(move || {
        let existing = store
            .voice_message(id)?
            .ok_or_else(|| ApiError::NotFound("voice message not found".to_string()))?;
        if existing.recipient_id != user {
            return Err(ApiError::Permission(
                "only the recipient can mark a message as heard".to_string(),
            ));
        }
        store.mark_voice_read(id)?;
        store
            .voice_message(id)?
            .ok_or_else(|| ApiError::NotFound("voice message not found".to_string()))
    })
    .await?;

    Ok(ok(json!({ "message": view(&state, message) })))
}

/// DELETE /api/voice-messages/{id} — sender only; the blob and its media
/// row go best-effort after the message row.
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = claims.sub;
    let store = state.store.clone();
    let audio_url = blocking(move || {
        let existing = store
            .voice_message(id)?
            .ok_or_else(|| ApiError::NotFound("voice message not found".to_string()))?;
        if existing.sender_id != user {
            return Err(ApiError::Permission(
                "you can only delete your own messages".to_string(),
            ));
        }
        store.delete_voice_message(id)?;
        Ok(existing.audio_url)
    })
    .await?;

    if let Some(media_id) = media_id_from_url(&audio_url) {
        state.media.remove(media_id).await;
        let store = state.store.clone();
        let _ = blocking(move || Ok(store.delete_media(media_id)?)).await;
    }

    Ok(ok(json!({ "deleted": true })))
}

fn media_id_from_url(url: &str) -> Option<Uuid> {
    url.strip_prefix("/media/").and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_id_parses_from_url() {
        let id = Uuid::new_v4();
        assert_eq!(media_id_from_url(&format!("/media/{}", id)), Some(id));
        assert_eq!(media_id_from_url("/uploads/whatever.ogg"), None);
        assert_eq!(media_id_from_url("/media/not-a-uuid"), None);
    }
}
