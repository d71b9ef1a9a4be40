//! Demo rows for the offline (in-memory) store, so the app has something to
//! show without a configured database.

use chrono::{Duration, Utc};
use uuid::Uuid;

use duet_types::models::{
    Comment, CountdownEvent, DailyLocation, Letter, Memory, Participant, VoiceMessage,
};

use crate::{Store, StoreError};

pub fn populate(store: &dyn Store) -> Result<(), StoreError> {
    let now = Utc::now();

    // A short letter thread, plus one scheduled letter still in transit.
    let root_id = Uuid::new_v4();
    let reply_id = Uuid::new_v4();
    store.insert_letter(&Letter {
        id: root_id,
        sender_id: Participant::Him,
        title: Some("Three years".to_string()),
        content: "Do you remember the cafe where we first talked until closing?".to_string(),
        reply_to: None,
        scheduled_delivery_at: None,
        delivered_at: Some(now - Duration::days(3)),
        read_at: Some(now - Duration::days(3) + Duration::hours(2)),
        created_at: now - Duration::days(3),
    })?;
    store.insert_letter(&Letter {
        id: reply_id,
        sender_id: Participant::Her,
        title: None,
        content: "Of course. They had to ask us to leave twice.".to_string(),
        reply_to: Some(root_id),
        scheduled_delivery_at: None,
        delivered_at: Some(now - Duration::days(2)),
        read_at: None,
        created_at: now - Duration::days(2),
    })?;
    store.insert_letter(&Letter {
        id: Uuid::new_v4(),
        sender_id: Participant::Him,
        title: Some("Open tomorrow".to_string()),
        content: "A little surprise for when you wake up.".to_string(),
        reply_to: None,
        scheduled_delivery_at: Some(now + Duration::days(1)),
        delivered_at: None,
        read_at: None,
        created_at: now - Duration::hours(1),
    })?;

    // Yesterday both checked in from different cities.
    let yesterday = now - Duration::days(1);
    store.insert_location(&DailyLocation {
        id: Uuid::new_v4(),
        user_id: Participant::Him,
        latitude: 39.9042,
        longitude: 116.4074,
        mood_emoji: Some("🌙".to_string()),
        created_at: yesterday,
    })?;
    store.insert_location(&DailyLocation {
        id: Uuid::new_v4(),
        user_id: Participant::Her,
        latitude: 31.2304,
        longitude: 121.4737,
        mood_emoji: Some("☕".to_string()),
        created_at: yesterday + Duration::minutes(40),
    })?;

    // One memory in the album, liked by both, with a tiny comment thread.
    let memory_id = Uuid::new_v4();
    store.insert_memory(&Memory {
        id: memory_id,
        user_id: Participant::Her,
        image_url: "https://picsum.photos/seed/duet-demo/800/600".to_string(),
        description: "Sunset from the train window on the way home.".to_string(),
        created_at: now - Duration::days(5),
    })?;
    for user in [Participant::Him, Participant::Her] {
        store.toggle_like(Uuid::new_v4(), memory_id, user, now - Duration::days(4))?;
    }
    let comment_id = Uuid::new_v4();
    store.insert_comment(&Comment {
        id: comment_id,
        memory_id,
        user_id: Participant::Him,
        content: "Wish I had been on that train.".to_string(),
        parent_comment_id: None,
        created_at: now - Duration::days(5) + Duration::hours(1),
        updated_at: now - Duration::days(5) + Duration::hours(1),
    })?;
    store.insert_comment(&Comment {
        id: Uuid::new_v4(),
        memory_id,
        user_id: Participant::Her,
        content: "Next time we take it together.".to_string(),
        parent_comment_id: Some(comment_id),
        created_at: now - Duration::days(5) + Duration::hours(2),
        updated_at: now - Duration::days(5) + Duration::hours(2),
    })?;

    store.insert_countdown(&CountdownEvent {
        id: Uuid::new_v4(),
        title: "Anniversary trip".to_string(),
        target_date: now + Duration::days(30),
        background_image_url: None,
        created_at: now - Duration::days(10),
        updated_at: now - Duration::days(10),
    })?;

    store.insert_voice_message(&VoiceMessage {
        id: Uuid::new_v4(),
        sender_id: Participant::Her,
        recipient_id: Participant::Him,
        audio_url: "https://example.com/demo/voice-note.webm".to_string(),
        duration: 12.4,
        is_read: false,
        created_at: now - Duration::hours(6),
    })?;

    Ok(())
}
