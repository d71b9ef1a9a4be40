//! Raw SQLite row shapes, distinct from the duet-types domain models.
//! Conversion surfaces corruption (bad uuid, unknown participant, malformed
//! timestamp) as `StoreError::Corrupt` instead of panicking.

use uuid::Uuid;

use duet_types::models::{
    Comment, CountdownEvent, DailyLocation, Letter, Like, MediaObject, Memory, Participant,
    VoiceMessage,
};

use crate::StoreError;
use crate::time::decode_ts;

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    s.parse()
        .map_err(|e| StoreError::Corrupt(format!("bad uuid '{}': {}", s, e)))
}

pub(crate) fn parse_participant(s: &str) -> Result<Participant, StoreError> {
    Participant::parse(s).ok_or_else(|| StoreError::Corrupt(format!("unknown participant '{}'", s)))
}

pub(crate) struct LetterRow {
    pub id: String,
    pub sender_id: String,
    pub title: Option<String>,
    pub content: String,
    pub reply_to: Option<String>,
    pub scheduled_delivery_at: Option<String>,
    pub delivered_at: Option<String>,
    pub read_at: Option<String>,
    pub created_at: String,
}

impl LetterRow {
    pub fn into_letter(self) -> Result<Letter, StoreError> {
        Ok(Letter {
            id: parse_uuid(&self.id)?,
            sender_id: parse_participant(&self.sender_id)?,
            title: self.title,
            content: self.content,
            reply_to: self.reply_to.as_deref().map(parse_uuid).transpose()?,
            scheduled_delivery_at: self
                .scheduled_delivery_at
                .as_deref()
                .map(decode_ts)
                .transpose()?,
            delivered_at: self.delivered_at.as_deref().map(decode_ts).transpose()?,
            read_at: self.read_at.as_deref().map(decode_ts).transpose()?,
            created_at: decode_ts(&self.created_at)?,
        })
    }
}

pub(crate) struct LocationRow {
    pub id: String,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub mood_emoji: Option<String>,
    pub created_at: String,
}

impl LocationRow {
    pub fn into_location(self) -> Result<DailyLocation, StoreError> {
        Ok(DailyLocation {
            id: parse_uuid(&self.id)?,
            user_id: parse_participant(&self.user_id)?,
            latitude: self.latitude,
            longitude: self.longitude,
            mood_emoji: self.mood_emoji,
            created_at: decode_ts(&self.created_at)?,
        })
    }
}

pub(crate) struct MemoryRow {
    pub id: String,
    pub user_id: String,
    pub image_url: String,
    pub description: String,
    pub created_at: String,
}

impl MemoryRow {
    pub fn into_memory(self) -> Result<Memory, StoreError> {
        Ok(Memory {
            id: parse_uuid(&self.id)?,
            user_id: parse_participant(&self.user_id)?,
            image_url: self.image_url,
            description: self.description,
            created_at: decode_ts(&self.created_at)?,
        })
    }
}

pub(crate) struct LikeRow {
    pub id: String,
    pub memory_id: String,
    pub user_id: String,
    pub created_at: String,
}

impl LikeRow {
    pub fn into_like(self) -> Result<Like, StoreError> {
        Ok(Like {
            id: parse_uuid(&self.id)?,
            memory_id: parse_uuid(&self.memory_id)?,
            user_id: parse_participant(&self.user_id)?,
            created_at: decode_ts(&self.created_at)?,
        })
    }
}

pub(crate) struct CommentRow {
    pub id: String,
    pub memory_id: String,
    pub user_id: String,
    pub content: String,
    pub parent_comment_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CommentRow {
    pub fn into_comment(self) -> Result<Comment, StoreError> {
        Ok(Comment {
            id: parse_uuid(&self.id)?,
            memory_id: parse_uuid(&self.memory_id)?,
            user_id: parse_participant(&self.user_id)?,
            content: self.content,
            parent_comment_id: self
                .parent_comment_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?,
            created_at: decode_ts(&self.created_at)?,
            updated_at: decode_ts(&self.updated_at)?,
        })
    }
}

pub(crate) struct CountdownRow {
    pub id: String,
    pub title: String,
    pub target_date: String,
    pub background_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CountdownRow {
    pub fn into_event(self) -> Result<CountdownEvent, StoreError> {
        Ok(CountdownEvent {
            id: parse_uuid(&self.id)?,
            title: self.title,
            target_date: decode_ts(&self.target_date)?,
            background_image_url: self.background_image_url,
            created_at: decode_ts(&self.created_at)?,
            updated_at: decode_ts(&self.updated_at)?,
        })
    }
}

pub(crate) struct VoiceRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub audio_url: String,
    pub duration: f64,
    pub is_read: bool,
    pub created_at: String,
}

impl VoiceRow {
    pub fn into_message(self) -> Result<VoiceMessage, StoreError> {
        Ok(VoiceMessage {
            id: parse_uuid(&self.id)?,
            sender_id: parse_participant(&self.sender_id)?,
            recipient_id: parse_participant(&self.recipient_id)?,
            audio_url: self.audio_url,
            duration: self.duration,
            is_read: self.is_read,
            created_at: decode_ts(&self.created_at)?,
        })
    }
}

pub(crate) struct MediaRow {
    pub id: String,
    pub owner_id: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: String,
}

impl MediaRow {
    pub fn into_media(self) -> Result<MediaObject, StoreError> {
        Ok(MediaObject {
            id: parse_uuid(&self.id)?,
            owner_id: parse_participant(&self.owner_id)?,
            content_type: self.content_type,
            size_bytes: self.size_bytes.max(0) as u64,
            created_at: decode_ts(&self.created_at)?,
        })
    }
}
