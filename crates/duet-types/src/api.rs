use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, Letter, Participant, VoiceMessage};

// -- JWT Claims --

/// JWT claims shared between the login handler (encode) and the auth
/// middleware (decode). Canonical definition lives here in duet-types to
/// eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Participant,
    pub name: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: Participant,
    pub name: String,
}

// -- Letters --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeLetterRequest {
    pub title: Option<String>,
    pub content: String,
    pub scheduled_delivery_at: Option<DateTime<Utc>>,
    pub reply_to: Option<Uuid>,
}

/// Letter plus the display metadata the client renders. `receiver_name` and
/// `thread_level` are only populated on thread views.
#[derive(Debug, Serialize)]
pub struct LetterView {
    #[serde(flatten)]
    pub letter: Letter,
    pub sender_name: String,
    pub is_sent_by_current_user: bool,
    pub is_delivered: bool,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_level: Option<u8>,
}

// -- Location --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocationSyncRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub mood_emoji: Option<String>,
}

// -- Likes / comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleLikeRequest {
    pub memory_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentRequest {
    pub memory_id: Uuid,
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub comment_id: Uuid,
    pub content: String,
}

/// Comment plus its computed nesting level (0 for top-level).
#[derive(Debug, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub level: u32,
}

// -- Countdown --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountdownEventRequest {
    pub title: String,
    pub target_date: DateTime<Utc>,
    pub background_image_url: Option<String>,
}

// -- Voice messages --

/// camelCase wire shape kept for the existing client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMessageView {
    pub id: Uuid,
    pub sender: Participant,
    pub sender_name: String,
    pub recipient: Participant,
    pub recipient_name: String,
    pub audio_url: String,
    pub duration: f64,
    pub timestamp: DateTime<Utc>,
    pub is_new: bool,
}

impl VoiceMessageView {
    pub fn new(msg: VoiceMessage, sender_name: &str, recipient_name: &str) -> Self {
        Self {
            id: msg.id,
            sender: msg.sender_id,
            sender_name: sender_name.to_string(),
            recipient: msg.recipient_id,
            recipient_name: recipient_name.to_string(),
            audio_url: msg.audio_url,
            duration: msg.duration,
            timestamp: msg.created_at,
            is_new: !msg.is_read,
        }
    }
}
