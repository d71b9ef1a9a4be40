//! Storage layer for the diary. One `Store` trait, two implementations:
//! [`SqliteStore`] for real deployments and [`MemoryStore`] for offline
//! demos and tests. The two must be observably equivalent; a shared
//! conformance suite in `tests/` exercises both.

pub mod memory;
pub mod seed;
pub mod sqlite;

mod rows;
mod time;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use duet_types::models::{
    Comment, CountdownEvent, DailyLocation, Letter, Like, MediaObject, Memory, MemoryWithStats,
    PairedDay, Participant, VoiceMessage,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Which slice of the mailbox a listing covers. Inbox and All only show
/// delivered letters; Sent shows the sender's own letters including ones
/// still waiting on their schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterScope {
    Inbox(Participant),
    Sent(Participant),
    All,
}

/// Synchronous storage operations behind the whole app. Handlers call these
/// through `spawn_blocking`; all timestamps are supplied by the caller so
/// both implementations behave identically and tests can inject times.
pub trait Store: Send + Sync {
    // -- Letters --

    fn insert_letter(&self, letter: &Letter) -> Result<(), StoreError>;
    fn letter(&self, id: Uuid) -> Result<Option<Letter>, StoreError>;
    /// Scoped listing, newest first.
    fn list_letters(
        &self,
        scope: LetterScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Letter>, StoreError>;
    fn count_letters(&self, scope: LetterScope) -> Result<u64, StoreError>;
    /// Delivered, unread letters addressed to the viewer.
    fn count_unread_letters(&self, viewer: Participant) -> Result<u64, StoreError>;
    /// Delivered direct replies to a letter, oldest first.
    fn delivered_replies(&self, parent: Uuid) -> Result<Vec<Letter>, StoreError>;
    /// Promote every due scheduled letter to delivered. The predicate is
    /// self-limiting (`delivered_at` still null), so concurrent sweeps are
    /// idempotent. Returns how many rows were promoted.
    fn deliver_due_letters(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
    /// Set `read_at` if not already set.
    fn mark_letter_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
    /// Delete, restricted to rows the given participant sent. Returns
    /// whether a row was removed.
    fn delete_letter(&self, id: Uuid, sender: Participant) -> Result<bool, StoreError>;

    // -- Daily locations --

    fn insert_location(&self, location: &DailyLocation) -> Result<(), StoreError>;
    fn location_on_day(
        &self,
        user: Participant,
        day: NaiveDate,
    ) -> Result<Option<DailyLocation>, StoreError>;
    /// Days on which both participants checked in, newest first.
    fn paired_location_days(&self, limit: u32, offset: u32)
    -> Result<Vec<PairedDay>, StoreError>;

    // -- Memories --

    fn insert_memory(&self, memory: &Memory) -> Result<(), StoreError>;
    fn memory(&self, id: Uuid) -> Result<Option<Memory>, StoreError>;
    /// Feed listing with like/comment stats attached, newest first.
    fn list_memories(&self, limit: u32, offset: u32) -> Result<Vec<MemoryWithStats>, StoreError>;
    fn count_memories(&self) -> Result<u64, StoreError>;

    // -- Likes --

    /// Insert the like if the participant hasn't liked this memory yet,
    /// remove it otherwise. Returns true when the like was added.
    fn toggle_like(
        &self,
        id: Uuid,
        memory_id: Uuid,
        user: Participant,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    fn likes_for_memory(&self, memory_id: Uuid) -> Result<Vec<Like>, StoreError>;

    // -- Comments --

    fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError>;
    fn comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;
    /// All comments on a memory, oldest first.
    fn list_comments(&self, memory_id: Uuid) -> Result<Vec<Comment>, StoreError>;
    /// Edit, restricted to the author. Returns whether a row matched.
    fn update_comment(
        &self,
        id: Uuid,
        user: Participant,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    /// Delete, restricted to the author; replies go with it.
    fn delete_comment(&self, id: Uuid, user: Participant) -> Result<bool, StoreError>;

    // -- Countdown events --

    fn insert_countdown(&self, event: &CountdownEvent) -> Result<(), StoreError>;
    fn countdown(&self, id: Uuid) -> Result<Option<CountdownEvent>, StoreError>;
    /// All events ordered by target date ascending.
    fn list_countdowns(&self) -> Result<Vec<CountdownEvent>, StoreError>;
    fn count_future_countdowns(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
    fn update_countdown(
        &self,
        id: Uuid,
        title: &str,
        target_date: DateTime<Utc>,
        background_image_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
    fn delete_countdown(&self, id: Uuid) -> Result<bool, StoreError>;
    fn delete_all_countdowns(&self) -> Result<usize, StoreError>;

    // -- Voice messages --

    fn insert_voice_message(&self, message: &VoiceMessage) -> Result<(), StoreError>;
    fn voice_message(&self, id: Uuid) -> Result<Option<VoiceMessage>, StoreError>;
    /// Newest first.
    fn list_voice_messages(&self) -> Result<Vec<VoiceMessage>, StoreError>;
    fn mark_voice_read(&self, id: Uuid) -> Result<bool, StoreError>;
    fn delete_voice_message(&self, id: Uuid) -> Result<bool, StoreError>;

    // -- Media objects --

    fn insert_media(&self, media: &MediaObject) -> Result<(), StoreError>;
    fn media(&self, id: Uuid) -> Result<Option<MediaObject>, StoreError>;
    fn delete_media(&self, id: Uuid) -> Result<bool, StoreError>;
}
