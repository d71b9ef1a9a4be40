//! One behavioral suite, run against both store implementations. The two
//! backends must be observably equivalent.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use duet_store::{LetterScope, MemoryStore, SqliteStore, Store};
use duet_types::models::{
    Comment, CountdownEvent, DailyLocation, Letter, Memory, MediaObject, Participant, VoiceMessage,
};

fn each_store(test: impl Fn(&dyn Store)) {
    let mem = MemoryStore::new();
    test(&mem);

    let dir = tempfile::tempdir().unwrap();
    let sqlite = SqliteStore::open(&dir.path().join("duet.db")).unwrap();
    test(&sqlite);
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
}

fn letter(sender: Participant, created: DateTime<Utc>, delivered: bool) -> Letter {
    Letter {
        id: Uuid::new_v4(),
        sender_id: sender,
        title: None,
        content: "hello".to_string(),
        reply_to: None,
        scheduled_delivery_at: if delivered { None } else { Some(created + Duration::hours(1)) },
        delivered_at: delivered.then_some(created),
        read_at: None,
        created_at: created,
    }
}

fn memory(user: Participant, created: DateTime<Utc>) -> Memory {
    Memory {
        id: Uuid::new_v4(),
        user_id: user,
        image_url: "/media/test".to_string(),
        description: "a moment".to_string(),
        created_at: created,
    }
}

fn comment(memory_id: Uuid, user: Participant, parent: Option<Uuid>, at: DateTime<Utc>) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        memory_id,
        user_id: user,
        content: "nice".to_string(),
        parent_comment_id: parent,
        created_at: at,
        updated_at: at,
    }
}

#[test]
fn letter_roundtrip_and_scopes() {
    each_store(|store| {
        let a = letter(Participant::Him, t0(), true);
        let b = letter(Participant::Her, t0() + Duration::minutes(1), true);
        let pending = letter(Participant::Him, t0() + Duration::minutes(2), false);
        for l in [&a, &b, &pending] {
            store.insert_letter(l).unwrap();
        }

        let got = store.letter(a.id).unwrap().unwrap();
        assert_eq!(got.content, "hello");
        assert_eq!(got.sender_id, Participant::Him);
        assert_eq!(got.created_at, t0());

        // Her inbox: delivered letters from him only.
        let inbox = store
            .list_letters(LetterScope::Inbox(Participant::Her), 20, 0)
            .unwrap();
        assert_eq!(inbox.iter().map(|l| l.id).collect::<Vec<_>>(), vec![a.id]);

        // His sent box includes the undelivered scheduled letter.
        let sent = store
            .list_letters(LetterScope::Sent(Participant::Him), 20, 0)
            .unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].id, pending.id, "newest first");

        // All: delivered only, newest first.
        let all = store.list_letters(LetterScope::All, 20, 0).unwrap();
        assert_eq!(all.iter().map(|l| l.id).collect::<Vec<_>>(), vec![b.id, a.id]);

        assert_eq!(store.count_letters(LetterScope::All).unwrap(), 2);
        assert_eq!(
            store.count_letters(LetterScope::Sent(Participant::Him)).unwrap(),
            2
        );
        assert_eq!(store.count_unread_letters(Participant::Her).unwrap(), 1);
    });
}

#[test]
fn pagination_limits_and_offsets() {
    each_store(|store| {
        for i in 0..5 {
            store
                .insert_letter(&letter(Participant::Him, t0() + Duration::minutes(i), true))
                .unwrap();
        }
        let first = store.list_letters(LetterScope::All, 2, 0).unwrap();
        let second = store.list_letters(LetterScope::All, 2, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert!(first[1].created_at > second[0].created_at);
        assert!(store.list_letters(LetterScope::All, 2, 10).unwrap().is_empty());
    });
}

#[test]
fn sweep_delivers_only_due_letters() {
    each_store(|store| {
        let mut due = letter(Participant::Him, t0(), false);
        due.scheduled_delivery_at = Some(t0() + Duration::hours(1));
        let mut later = letter(Participant::Him, t0(), false);
        later.scheduled_delivery_at = Some(t0() + Duration::hours(5));
        store.insert_letter(&due).unwrap();
        store.insert_letter(&later).unwrap();

        let sweep_at = t0() + Duration::hours(2);
        assert_eq!(store.deliver_due_letters(sweep_at).unwrap(), 1);

        let delivered = store.letter(due.id).unwrap().unwrap();
        assert_eq!(delivered.delivered_at, Some(sweep_at));
        assert!(store.letter(later.id).unwrap().unwrap().delivered_at.is_none());

        // Idempotent: nothing left to promote at the same instant.
        assert_eq!(store.deliver_due_letters(sweep_at).unwrap(), 0);
    });
}

#[test]
fn mark_read_is_set_once() {
    each_store(|store| {
        let l = letter(Participant::Him, t0(), true);
        store.insert_letter(&l).unwrap();

        let first = t0() + Duration::hours(1);
        store.mark_letter_read(l.id, first).unwrap();
        store.mark_letter_read(l.id, t0() + Duration::hours(9)).unwrap();

        assert_eq!(store.letter(l.id).unwrap().unwrap().read_at, Some(first));
    });
}

#[test]
fn delete_letter_is_sender_scoped() {
    each_store(|store| {
        let l = letter(Participant::Him, t0(), true);
        store.insert_letter(&l).unwrap();

        assert!(!store.delete_letter(l.id, Participant::Her).unwrap());
        assert!(store.letter(l.id).unwrap().is_some(), "row untouched");

        assert!(store.delete_letter(l.id, Participant::Him).unwrap());
        assert!(store.letter(l.id).unwrap().is_none());
    });
}

#[test]
fn delivered_replies_are_ordered_and_filtered() {
    each_store(|store| {
        let root = letter(Participant::Him, t0(), true);
        store.insert_letter(&root).unwrap();

        let mut r1 = letter(Participant::Her, t0() + Duration::minutes(10), true);
        r1.reply_to = Some(root.id);
        let mut r2 = letter(Participant::Her, t0() + Duration::minutes(5), true);
        r2.reply_to = Some(root.id);
        let mut hidden = letter(Participant::Her, t0() + Duration::minutes(7), false);
        hidden.reply_to = Some(root.id);
        for l in [&r1, &r2, &hidden] {
            store.insert_letter(l).unwrap();
        }

        let replies = store.delivered_replies(root.id).unwrap();
        assert_eq!(
            replies.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![r2.id, r1.id],
            "oldest first, undelivered excluded"
        );
    });
}

#[test]
fn one_location_per_day_lookup_and_pairing() {
    each_store(|store| {
        let him_day1 = DailyLocation {
            id: Uuid::new_v4(),
            user_id: Participant::Him,
            latitude: 39.9042,
            longitude: 116.4074,
            mood_emoji: Some("🙂".to_string()),
            created_at: t0(),
        };
        let her_day1 = DailyLocation {
            id: Uuid::new_v4(),
            user_id: Participant::Her,
            latitude: 31.2304,
            longitude: 121.4737,
            mood_emoji: None,
            created_at: t0() + Duration::hours(3),
        };
        let him_day2 = DailyLocation {
            id: Uuid::new_v4(),
            user_id: Participant::Him,
            latitude: 40.0,
            longitude: 116.0,
            mood_emoji: None,
            created_at: t0() + Duration::days(1),
        };
        for l in [&him_day1, &her_day1, &him_day2] {
            store.insert_location(l).unwrap();
        }

        let found = store
            .location_on_day(Participant::Him, t0().date_naive())
            .unwrap()
            .unwrap();
        assert_eq!(found.id, him_day1.id);
        assert!(store
            .location_on_day(Participant::Her, (t0() + Duration::days(1)).date_naive())
            .unwrap()
            .is_none());

        // Day 2 has only one check-in, so only day 1 pairs.
        let paired = store.paired_location_days(10, 0).unwrap();
        assert_eq!(paired.len(), 1);
        assert_eq!(paired[0].date, t0().date_naive());
        assert_eq!(paired[0].him.id, him_day1.id);
        assert_eq!(paired[0].her.id, her_day1.id);
    });
}

#[test]
fn memory_stats_track_likes_and_comments() {
    each_store(|store| {
        let m = memory(Participant::Her, t0());
        store.insert_memory(&m).unwrap();

        assert!(store
            .toggle_like(Uuid::new_v4(), m.id, Participant::Him, t0())
            .unwrap());
        store
            .insert_comment(&comment(m.id, Participant::Her, None, t0()))
            .unwrap();

        let listed = store.list_memories(10, 0).unwrap();
        assert_eq!(listed.len(), 1);
        let stats = &listed[0];
        assert_eq!(stats.memory.id, m.id);
        assert_eq!(stats.like_count, 1);
        assert_eq!(stats.comment_count, 1);
        assert!(stats.liked_by_him);
        assert!(!stats.liked_by_her);
        assert_eq!(store.count_memories().unwrap(), 1);
    });
}

#[test]
fn like_toggle_alternates() {
    each_store(|store| {
        let m = memory(Participant::Him, t0());
        store.insert_memory(&m).unwrap();

        assert!(store
            .toggle_like(Uuid::new_v4(), m.id, Participant::Her, t0())
            .unwrap());
        assert_eq!(store.likes_for_memory(m.id).unwrap().len(), 1);
        assert!(!store
            .toggle_like(Uuid::new_v4(), m.id, Participant::Her, t0())
            .unwrap());
        assert!(store.likes_for_memory(m.id).unwrap().is_empty());
    });
}

#[test]
fn comment_delete_cascades_to_replies() {
    each_store(|store| {
        let m = memory(Participant::Him, t0());
        store.insert_memory(&m).unwrap();

        let top = comment(m.id, Participant::Him, None, t0());
        let reply = comment(m.id, Participant::Her, Some(top.id), t0() + Duration::minutes(1));
        let nested = comment(m.id, Participant::Him, Some(reply.id), t0() + Duration::minutes(2));
        let unrelated = comment(m.id, Participant::Her, None, t0() + Duration::minutes(3));
        for c in [&top, &reply, &nested, &unrelated] {
            store.insert_comment(c).unwrap();
        }

        // Author-scoped: her delete of his comment is a no-op.
        assert!(!store.delete_comment(top.id, Participant::Her).unwrap());
        assert_eq!(store.list_comments(m.id).unwrap().len(), 4);

        assert!(store.delete_comment(top.id, Participant::Him).unwrap());
        let remaining = store.list_comments(m.id).unwrap();
        assert_eq!(remaining.iter().map(|c| c.id).collect::<Vec<_>>(), vec![unrelated.id]);
    });
}

#[test]
fn comment_update_is_author_scoped() {
    each_store(|store| {
        let m = memory(Participant::Him, t0());
        store.insert_memory(&m).unwrap();
        let c = comment(m.id, Participant::Him, None, t0());
        store.insert_comment(&c).unwrap();

        let later = t0() + Duration::hours(1);
        assert!(!store
            .update_comment(c.id, Participant::Her, "edited", later)
            .unwrap());
        assert!(store
            .update_comment(c.id, Participant::Him, "edited", later)
            .unwrap());

        let got = store.comment(c.id).unwrap().unwrap();
        assert_eq!(got.content, "edited");
        assert_eq!(got.updated_at, later);
    });
}

#[test]
fn countdown_crud_and_future_count() {
    each_store(|store| {
        let past = CountdownEvent {
            id: Uuid::new_v4(),
            title: "Old trip".to_string(),
            target_date: t0() - Duration::days(1),
            background_image_url: None,
            created_at: t0() - Duration::days(30),
            updated_at: t0() - Duration::days(30),
        };
        let future = CountdownEvent {
            id: Uuid::new_v4(),
            title: "Birthday".to_string(),
            target_date: t0() + Duration::days(10),
            background_image_url: Some("/media/bg".to_string()),
            created_at: t0(),
            updated_at: t0(),
        };
        store.insert_countdown(&past).unwrap();
        store.insert_countdown(&future).unwrap();

        let listed = store.list_countdowns().unwrap();
        assert_eq!(listed.iter().map(|e| e.id).collect::<Vec<_>>(), vec![past.id, future.id]);
        assert_eq!(store.count_future_countdowns(t0()).unwrap(), 1);

        assert!(store
            .update_countdown(future.id, "Birthday!", t0() + Duration::days(12), None, t0())
            .unwrap());
        let updated = store.countdown(future.id).unwrap().unwrap();
        assert_eq!(updated.title, "Birthday!");
        assert_eq!(updated.background_image_url, None);

        assert!(store.delete_countdown(past.id).unwrap());
        assert!(!store.delete_countdown(past.id).unwrap());
        assert_eq!(store.delete_all_countdowns().unwrap(), 1);
        assert!(store.list_countdowns().unwrap().is_empty());
    });
}

#[test]
fn voice_message_lifecycle() {
    each_store(|store| {
        let msg = VoiceMessage {
            id: Uuid::new_v4(),
            sender_id: Participant::Her,
            recipient_id: Participant::Him,
            audio_url: "/media/clip".to_string(),
            duration: 7.5,
            is_read: false,
            created_at: t0(),
        };
        store.insert_voice_message(&msg).unwrap();

        let listed = store.list_voice_messages().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_read);

        assert!(store.mark_voice_read(msg.id).unwrap());
        assert!(store.voice_message(msg.id).unwrap().unwrap().is_read);

        assert!(store.delete_voice_message(msg.id).unwrap());
        assert!(store.voice_message(msg.id).unwrap().is_none());
    });
}

#[test]
fn media_object_roundtrip() {
    each_store(|store| {
        let media = MediaObject {
            id: Uuid::new_v4(),
            owner_id: Participant::Him,
            content_type: "image/png".to_string(),
            size_bytes: 2048,
            created_at: t0(),
        };
        store.insert_media(&media).unwrap();

        let got = store.media(media.id).unwrap().unwrap();
        assert_eq!(got.content_type, "image/png");
        assert_eq!(got.size_bytes, 2048);

        assert!(store.delete_media(media.id).unwrap());
        assert!(!store.delete_media(media.id).unwrap());
    });
}
