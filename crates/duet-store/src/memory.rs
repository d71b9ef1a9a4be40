use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use duet_types::models::{
    Comment, CountdownEvent, DailyLocation, Letter, Like, MediaObject, Memory, MemoryWithStats,
    PairedDay, Participant, VoiceMessage,
};

use crate::{LetterScope, Store, StoreError};

/// In-memory store for offline demos and tests. Plain collections behind a
/// mutex; must stay observably equivalent to `SqliteStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    letters: Vec<Letter>,
    locations: Vec<DailyLocation>,
    memories: Vec<Memory>,
    likes: Vec<Like>,
    comments: Vec<Comment>,
    countdowns: Vec<CountdownEvent>,
    voice_messages: Vec<VoiceMessage>,
    media: Vec<MediaObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo-mode store pre-populated with a plausible history.
    pub fn seeded() -> Self {
        let store = Self::new();
        crate::seed::populate(&store).expect("seeding an in-memory store cannot fail");
        store
    }

    fn with<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Inner) -> T,
    {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut inner))
    }
}

fn in_scope(letter: &Letter, scope: LetterScope) -> bool {
    match scope {
        LetterScope::Inbox(viewer) => {
            letter.sender_id == viewer.other() && letter.delivered_at.is_some()
        }
        LetterScope::Sent(sender) => letter.sender_id == sender,
        LetterScope::All => letter.delivered_at.is_some(),
    }
}

fn page<T>(mut items: Vec<T>, limit: u32, offset: u32) -> Vec<T> {
    let offset = offset as usize;
    if offset >= items.len() {
        return Vec::new();
    }
    let mut tail = items.split_off(offset);
    tail.truncate(limit as usize);
    tail
}

impl Store for MemoryStore {
    // -- Letters --

    fn insert_letter(&self, letter: &Letter) -> Result<(), StoreError> {
        self.with(|inner| inner.letters.push(letter.clone()))
    }

    fn letter(&self, id: Uuid) -> Result<Option<Letter>, StoreError> {
        self.with(|inner| inner.letters.iter().find(|l| l.id == id).cloned())
    }

    fn list_letters(
        &self,
        scope: LetterScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Letter>, StoreError> {
        self.with(|inner| {
            let mut matched: Vec<Letter> = inner
                .letters
                .iter()
                .filter(|l| in_scope(l, scope))
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            page(matched, limit, offset)
        })
    }

    fn count_letters(&self, scope: LetterScope) -> Result<u64, StoreError> {
        self.with(|inner| inner.letters.iter().filter(|l| in_scope(l, scope)).count() as u64)
    }

    fn count_unread_letters(&self, viewer: Participant) -> Result<u64, StoreError> {
        self.with(|inner| {
            inner
                .letters
                .iter()
                .filter(|l| {
                    l.sender_id == viewer.other()
                        && l.delivered_at.is_some()
                        && l.read_at.is_none()
                })
                .count() as u64
        })
    }

    fn delivered_replies(&self, parent: Uuid) -> Result<Vec<Letter>, StoreError> {
        self.with(|inner| {
            let mut replies: Vec<Letter> = inner
                .letters
                .iter()
                .filter(|l| l.reply_to == Some(parent) && l.delivered_at.is_some())
                .cloned()
                .collect();
            replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            replies
        })
    }

    fn deliver_due_letters(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.with(|inner| {
            let mut delivered = 0;
            for letter in &mut inner.letters {
                if letter.delivered_at.is_none()
                    && letter
                        .scheduled_delivery_at
                        .is_some_and(|due| due <= now)
                {
                    letter.delivered_at = Some(now);
                    delivered += 1;
                }
            }
            delivered
        })
    }

    fn mark_letter_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.with(|inner| {
            if let Some(letter) = inner.letters.iter_mut().find(|l| l.id == id)
                && letter.read_at.is_none()
            {
                letter.read_at = Some(at);
            }
        })
    }

    fn delete_letter(&self, id: Uuid, sender: Participant) -> Result<bool, StoreError> {
        self.with(|inner| {
            let before = inner.letters.len();
            inner
                .letters
                .retain(|l| !(l.id == id && l.sender_id == sender));
            inner.letters.len() < before
        })
    }

    // -- Daily locations --

    fn insert_location(&self, location: &DailyLocation) -> Result<(), StoreError> {
        self.with(|inner| inner.locations.push(location.clone()))
    }

    fn location_on_day(
        &self,
        user: Participant,
        day: NaiveDate,
    ) -> Result<Option<DailyLocation>, StoreError> {
        self.with(|inner| {
            inner
                .locations
                .iter()
                .find(|l| l.user_id == user && l.created_at.date_naive() == day)
                .cloned()
        })
    }

    fn paired_location_days(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PairedDay>, StoreError> {
        self.with(|inner| {
            let mut days: Vec<NaiveDate> = inner
                .locations
                .iter()
                .map(|l| l.created_at.date_naive())
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            days.sort_unstable_by(|a, b| b.cmp(a));

            let paired: Vec<PairedDay> = days
                .into_iter()
                .filter_map(|date| {
                    let him = inner.locations.iter().find(|l| {
                        l.user_id == Participant::Him && l.created_at.date_naive() == date
                    })?;
                    let her = inner.locations.iter().find(|l| {
                        l.user_id == Participant::Her && l.created_at.date_naive() == date
                    })?;
                    Some(PairedDay {
                        date,
                        him: him.clone(),
                        her: her.clone(),
                    })
                })
                .collect();
            page(paired, limit, offset)
        })
    }

    // -- Memories --

    fn insert_memory(&self, memory: &Memory) -> Result<(), StoreError> {
        self.with(|inner| inner.memories.push(memory.clone()))
    }

    fn memory(&self, id: Uuid) -> Result<Option<Memory>, StoreError> {
        self.with(|inner| inner.memories.iter().find(|m| m.id == id).cloned())
    }

    fn list_memories(&self, limit: u32, offset: u32) -> Result<Vec<MemoryWithStats>, StoreError> {
        self.with(|inner| {
            let mut memories = inner.memories.clone();
            memories.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let stats: Vec<MemoryWithStats> = memories
                .into_iter()
                .map(|memory| {
                    let likes: Vec<&Like> = inner
                        .likes
                        .iter()
                        .filter(|l| l.memory_id == memory.id)
                        .collect();
                    let comment_count = inner
                        .comments
                        .iter()
                        .filter(|c| c.memory_id == memory.id)
                        .count() as u64;
                    MemoryWithStats {
                        like_count: likes.len() as u64,
                        comment_count,
                        liked_by_him: likes.iter().any(|l| l.user_id == Participant::Him),
                        liked_by_her: likes.iter().any(|l| l.user_id == Participant::Her),
                        memory,
                    }
                })
                .collect();
            page(stats, limit, offset)
        })
    }

    fn count_memories(&self) -> Result<u64, StoreError> {
        self.with(|inner| inner.memories.len() as u64)
    }

    // -- Likes --

    fn toggle_like(
        &self,
        id: Uuid,
        memory_id: Uuid,
        user: Participant,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.with(|inner| {
            if let Some(pos) = inner
                .likes
                .iter()
                .position(|l| l.memory_id == memory_id && l.user_id == user)
            {
                inner.likes.remove(pos);
                false
            } else {
                inner.likes.push(Like {
                    id,
                    memory_id,
                    user_id: user,
                    created_at: now,
                });
                true
            }
        })
    }

    fn likes_for_memory(&self, memory_id: Uuid) -> Result<Vec<Like>, StoreError> {
        self.with(|inner| {
            let mut likes: Vec<Like> = inner
                .likes
                .iter()
                .filter(|l| l.memory_id == memory_id)
                .cloned()
                .collect();
            likes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            likes
        })
    }

    // -- Comments --

    fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.with(|inner| inner.comments.push(comment.clone()))
    }

    fn comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.with(|inner| inner.comments.iter().find(|c| c.id == id).cloned())
    }

    fn list_comments(&self, memory_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        self.with(|inner| {
            let mut comments: Vec<Comment> = inner
                .comments
                .iter()
                .filter(|c| c.memory_id == memory_id)
                .cloned()
                .collect();
            comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            comments
        })
    }

    fn update_comment(
        &self,
        id: Uuid,
        user: Participant,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.with(|inner| {
            match inner
                .comments
                .iter_mut()
                .find(|c| c.id == id && c.user_id == user)
            {
                Some(comment) => {
                    comment.content = content.to_string();
                    comment.updated_at = now;
                    true
                }
                None => false,
            }
        })
    }

    fn delete_comment(&self, id: Uuid, user: Participant) -> Result<bool, StoreError> {
        self.with(|inner| {
            if !inner
                .comments
                .iter()
                .any(|c| c.id == id && c.user_id == user)
            {
                return false;
            }

            // Collect the whole reply subtree, then drop it in one pass.
            let mut doomed: HashSet<Uuid> = HashSet::from([id]);
            let mut frontier = vec![id];
            while let Some(parent) = frontier.pop() {
                for child in inner
                    .comments
                    .iter()
                    .filter(|c| c.parent_comment_id == Some(parent))
                {
                    if doomed.insert(child.id) {
                        frontier.push(child.id);
                    }
                }
            }
            inner.comments.retain(|c| !doomed.contains(&c.id));
            true
        })
    }

    // -- Countdown events --

    fn insert_countdown(&self, event: &CountdownEvent) -> Result<(), StoreError> {
        self.with(|inner| inner.countdowns.push(event.clone()))
    }

    fn countdown(&self, id: Uuid) -> Result<Option<CountdownEvent>, StoreError> {
        self.with(|inner| inner.countdowns.iter().find(|e| e.id == id).cloned())
    }

    fn list_countdowns(&self) -> Result<Vec<CountdownEvent>, StoreError> {
        self.with(|inner| {
            let mut events = inner.countdowns.clone();
            events.sort_by(|a, b| a.target_date.cmp(&b.target_date));
            events
        })
    }

    fn count_future_countdowns(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.with(|inner| {
            inner
                .countdowns
                .iter()
                .filter(|e| e.target_date > now)
                .count() as u64
        })
    }

    fn update_countdown(
        &self,
        id: Uuid,
        title: &str,
        target_date: DateTime<Utc>,
        background_image_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.with(|inner| {
            match inner.countdowns.iter_mut().find(|e| e.id == id) {
                Some(event) => {
                    event.title = title.to_string();
                    event.target_date = target_date;
                    event.background_image_url = background_image_url.map(str::to_string);
                    event.updated_at = now;
                    true
                }
                None => false,
            }
        })
    }

    fn delete_countdown(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with(|inner| {
            let before = inner.countdowns.len();
            inner.countdowns.retain(|e| e.id != id);
            inner.countdowns.len() < before
        })
    }

    fn delete_all_countdowns(&self) -> Result<usize, StoreError> {
        self.with(|inner| {
            let removed = inner.countdowns.len();
            inner.countdowns.clear();
            removed
        })
    }

    // -- Voice messages --

    fn insert_voice_message(&self, message: &VoiceMessage) -> Result<(), StoreError> {
        self.with(|inner| inner.voice_messages.push(message.clone()))
    }

    fn voice_message(&self, id: Uuid) -> Result<Option<VoiceMessage>, StoreError> {
        self.with(|inner| inner.voice_messages.iter().find(|m| m.id == id).cloned())
    }

    fn list_voice_messages(&self) -> Result<Vec<VoiceMessage>, StoreError> {
        self.with(|inner| {
            let mut messages = inner.voice_messages.clone();
            messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            messages
        })
    }

    fn mark_voice_read(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with(|inner| {
            match inner.voice_messages.iter_mut().find(|m| m.id == id) {
                Some(message) => {
                    message.is_read = true;
                    true
                }
                None => false,
            }
        })
    }

    fn delete_voice_message(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with(|inner| {
            let before = inner.voice_messages.len();
            inner.voice_messages.retain(|m| m.id != id);
            inner.voice_messages.len() < before
        })
    }

    // -- Media objects --

    fn insert_media(&self, media: &MediaObject) -> Result<(), StoreError> {
        self.with(|inner| inner.media.push(media.clone()))
    }

    fn media(&self, id: Uuid) -> Result<Option<MediaObject>, StoreError> {
        self.with(|inner| inner.media.iter().find(|m| m.id == id).cloned())
    }

    fn delete_media(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with(|inner| {
            let before = inner.media.len();
            inner.media.retain(|m| m.id != id);
            inner.media.len() < before
        })
    }
}
