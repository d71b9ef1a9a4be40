use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use duet_mailbox::{Compose, gate};
use duet_store::LetterScope;
use duet_types::Participant;
use duet_types::api::{Claims, ComposeLetterRequest, LetterView};
use duet_types::models::Letter;

use crate::auth::{AppState, AppStateInner};
use crate::error::{ApiError, blocking, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct LetterListQuery {
    /// inbox | sent | all (default)
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

fn list_view(state: &AppStateInner, viewer: Participant, letter: Letter) -> LetterView {
    LetterView {
        sender_name: state.display_name(letter.sender_id).to_string(),
        is_sent_by_current_user: letter.sender_id == viewer,
        is_delivered: letter.is_delivered(),
        is_read: letter.is_read(),
        receiver_name: None,
        thread_level: None,
        letter,
    }
}

fn thread_entry(state: &AppStateInner, viewer: Participant, letter: Letter) -> LetterView {
    let mut view = list_view(state, viewer, letter);
    view.receiver_name = Some(
        state
            .display_name(view.letter.sender_id.other())
            .to_string(),
    );
    // Nesting is deliberately flattened to root vs. reply.
    view.thread_level = Some(u8::from(view.letter.reply_to.is_some()));
    view
}

/// GET /api/letters — scoped listing. Due scheduled letters are swept
/// before the select, so a mailbox read is what actually delivers them.
pub async fn list_letters(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<LetterListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let scope = match query.kind.as_deref() {
        Some("inbox") => LetterScope::Inbox(viewer),
        Some("sent") => LetterScope::Sent(viewer),
        _ => LetterScope::All,
    };
    let limit = query.limit.min(100);
    let offset = query.offset;

    let store = state.store.clone();
    let (letters, total, unread) = blocking(move || {
        gate::sweep_due(store.as_ref(), Utc::now());
        let letters = store.list_letters(scope, limit, offset)?;
        let total = store.count_letters(scope)?;
        let unread = store.count_unread_letters(viewer)?;
        Ok((letters, total, unread))
    })
    .await?;

    let has_more = letters.len() as u32 == limit;
    let views: Vec<LetterView> = letters
        .into_iter()
        .map(|l| list_view(&state, viewer, l))
        .collect();

    Ok(ok(json!({
        "letters": views,
        "total": total,
        "unreadCount": unread,
        "hasMore": has_more,
    })))
}

/// POST /api/letters — compose, immediate or scheduled.
pub async fn compose_letter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ComposeLetterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sender = claims.sub;
    let input = Compose {
        title: req.title,
        content: req.content,
        scheduled_delivery_at: req.scheduled_delivery_at,
        reply_to: req.reply_to,
    };

    let store = state.store.clone();
    let letter = blocking(move || Ok(gate::compose(store.as_ref(), sender, input, Utc::now())?)).await?;

    let message = if letter.scheduled_delivery_at.is_some() {
        "letter scheduled for delivery"
    } else {
        "letter sent"
    };
    Ok(ok_with_message(
        json!({ "letter": list_view(&state, sender, letter) }),
        message,
    ))
}

/// PUT /api/letters/{id} — recipient marks a delivered letter read.
pub async fn mark_letter_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let store = state.store.clone();
    let letter =
        blocking(move || Ok(gate::mark_read(store.as_ref(), id, viewer, Utc::now())?)).await?;

    Ok(ok(json!({ "letter": list_view(&state, viewer, letter) })))
}

/// DELETE /api/letters/{id} — sender only.
pub async fn delete_letter(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub;
    let store = state.store.clone();
    blocking(move || Ok(gate::delete_letter(store.as_ref(), id, requester)?)).await?;

    Ok(Json(json!({ "success": true, "message": "letter deleted" })))
}

/// GET /api/letters/{id}/thread — the whole conversation, oldest first.
pub async fn get_thread(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let store = state.store.clone();
    let thread = blocking(move || {
        gate::sweep_due(store.as_ref(), Utc::now());
        Ok(duet_mailbox::reconstruct(store.as_ref(), id)?)
    })
    .await?;

    let total = thread.len();
    let entries: Vec<LetterView> = thread
        .into_iter()
        .map(|l| thread_entry(&state, viewer, l))
        .collect();

    Ok(ok(json!({
        "thread": entries,
        "totalMessages": total,
    })))
}
