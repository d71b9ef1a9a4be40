use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// There are exactly two people in this app, ever. Keeping that a closed
/// enum (instead of a user table) makes the cardinality compiler-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    Him,
    Her,
}

impl Participant {
    /// The other half of the couple.
    pub fn other(self) -> Self {
        match self {
            Participant::Him => Participant::Her,
            Participant::Her => Participant::Him,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Participant::Him => "him",
            Participant::Her => "her",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "him" => Some(Participant::Him),
            "her" => Some(Participant::Her),
            _ => None,
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A letter in the mailbox. Delivery may be deferred: a letter composed with
/// a future `scheduled_delivery_at` stays invisible to the recipient until a
/// sweep promotes it (`delivered_at` set). `reply_to` forms a parent-pointer
/// forest over the letter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Letter {
    pub id: Uuid,
    pub sender_id: Participant,
    pub title: Option<String>,
    pub content: String,
    pub reply_to: Option<Uuid>,
    pub scheduled_delivery_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Letter {
    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// One location check-in. At most one per participant per UTC day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLocation {
    pub id: Uuid,
    pub user_id: Participant,
    pub latitude: f64,
    pub longitude: f64,
    pub mood_emoji: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A day on which both participants checked in.
#[derive(Debug, Clone, Serialize)]
pub struct PairedDay {
    pub date: NaiveDate,
    pub him: DailyLocation,
    pub her: DailyLocation,
}

/// One photo in the shared album.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub user_id: Participant,
    pub image_url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Feed view of a memory with its like/comment counters attached.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryWithStats {
    #[serde(flatten)]
    pub memory: Memory,
    pub like_count: u64,
    pub comment_count: u64,
    pub liked_by_him: bool,
    pub liked_by_her: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub memory_id: Uuid,
    pub user_id: Participant,
    pub created_at: DateTime<Utc>,
}

/// A comment on a memory. `parent_comment_id` points at another comment on
/// the same memory; deleting a comment removes its replies with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub memory_id: Uuid,
    pub user_id: Participant,
    pub content: String,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEvent {
    pub id: Uuid,
    pub title: String,
    pub target_date: DateTime<Utc>,
    pub background_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceMessage {
    pub id: Uuid,
    pub sender_id: Participant,
    pub recipient_id: Participant,
    pub audio_url: String,
    /// Clip length in seconds, as reported by the recorder.
    pub duration: f64,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Database record for an uploaded blob. The bytes themselves live on disk
/// under the media directory, one flat file per id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaObject {
    pub id: Uuid,
    pub owner_id: Participant,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_other_flips() {
        assert_eq!(Participant::Him.other(), Participant::Her);
        assert_eq!(Participant::Her.other(), Participant::Him);
    }

    #[test]
    fn participant_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Participant::Him).unwrap(), "\"him\"");
        let p: Participant = serde_json::from_str("\"her\"").unwrap();
        assert_eq!(p, Participant::Her);
    }

    #[test]
    fn participant_parse_rejects_unknown() {
        assert_eq!(Participant::parse("him"), Some(Participant::Him));
        assert_eq!(Participant::parse("them"), None);
    }
}
