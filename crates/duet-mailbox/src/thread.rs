//! Conversation reconstruction: climb to the thread root, then walk the
//! reply tree. Both directions use an explicit worklist with a visited set,
//! so a cycle that somehow made it into the store cannot hang the walk.

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

use duet_store::Store;
use duet_types::models::Letter;

use crate::MailboxError;

/// Full, chronologically ordered conversation containing the given letter.
///
/// The root itself is included even when undelivered (the sender previewing
/// their own scheduled letter); undelivered descendants never appear. A
/// missing parent stops the climb and the current letter becomes the
/// effective root — orphans fail open rather than erroring.
pub fn reconstruct(store: &dyn Store, start: Uuid) -> Result<Vec<Letter>, MailboxError> {
    let mut current = store.letter(start)?.ok_or(MailboxError::NotFound)?;

    let mut climbed: HashSet<Uuid> = HashSet::from([current.id]);
    while let Some(parent_id) = current.reply_to {
        if !climbed.insert(parent_id) {
            break;
        }
        match store.letter(parent_id)? {
            Some(parent) => current = parent,
            None => break,
        }
    }
    let root = current;

    let mut thread = vec![root.clone()];
    let mut seen: HashSet<Uuid> = HashSet::from([root.id]);
    let mut queue = VecDeque::from([root.id]);
    while let Some(id) = queue.pop_front() {
        for child in store.delivered_replies(id)? {
            if seen.insert(child.id) {
                queue.push_back(child.id);
                thread.push(child);
            }
        }
    }

    thread.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(thread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use duet_store::MemoryStore;
    use duet_types::models::Participant;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn insert(
        store: &MemoryStore,
        sender: Participant,
        reply_to: Option<Uuid>,
        created: DateTime<Utc>,
        delivered: bool,
    ) -> Letter {
        let letter = Letter {
            id: Uuid::new_v4(),
            sender_id: sender,
            title: None,
            content: "x".to_string(),
            reply_to,
            scheduled_delivery_at: (!delivered).then(|| created + Duration::days(1)),
            delivered_at: delivered.then_some(created),
            read_at: None,
            created_at: created,
        };
        store.insert_letter(&letter).unwrap();
        letter
    }

    #[test]
    fn missing_start_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            reconstruct(&store, Uuid::new_v4()),
            Err(MailboxError::NotFound)
        ));
    }

    #[test]
    fn three_letter_thread_in_creation_order() {
        let store = MemoryStore::new();
        let l1 = insert(&store, Participant::Him, None, now(), true);
        let l2 = insert(&store, Participant::Her, Some(l1.id), now() + Duration::hours(1), true);
        let l3 = insert(&store, Participant::Him, Some(l2.id), now() + Duration::hours(2), true);

        let thread = reconstruct(&store, l3.id).unwrap();
        assert_eq!(
            thread.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![l1.id, l2.id, l3.id]
        );
    }

    #[test]
    fn same_thread_from_any_start_node() {
        let store = MemoryStore::new();
        let l1 = insert(&store, Participant::Him, None, now(), true);
        let l2 = insert(&store, Participant::Her, Some(l1.id), now() + Duration::hours(1), true);
        let l3 = insert(&store, Participant::Him, Some(l2.id), now() + Duration::hours(2), true);
        let l4 = insert(&store, Participant::Him, Some(l1.id), now() + Duration::hours(3), true);

        let expected: Vec<Uuid> = vec![l1.id, l2.id, l3.id, l4.id];
        for start in [l1.id, l2.id, l3.id, l4.id] {
            let thread = reconstruct(&store, start).unwrap();
            assert_eq!(thread.iter().map(|l| l.id).collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let store = MemoryStore::new();
        let l1 = insert(&store, Participant::Him, None, now(), true);
        let l2 = insert(&store, Participant::Her, Some(l1.id), now() + Duration::hours(1), true);

        let first = reconstruct(&store, l2.id).unwrap();
        let second = reconstruct(&store, l2.id).unwrap();
        assert_eq!(
            first.iter().map(|l| l.id).collect::<Vec<_>>(),
            second.iter().map(|l| l.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn undelivered_replies_stay_invisible() {
        let store = MemoryStore::new();
        let l1 = insert(&store, Participant::Him, None, now(), true);
        let hidden = insert(&store, Participant::Her, Some(l1.id), now() + Duration::hours(1), false);
        let visible = insert(&store, Participant::Her, Some(l1.id), now() + Duration::hours(2), true);

        let thread = reconstruct(&store, l1.id).unwrap();
        let ids: Vec<Uuid> = thread.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![l1.id, visible.id]);
        assert!(!ids.contains(&hidden.id));
    }

    #[test]
    fn undelivered_root_is_included_when_started_from() {
        let store = MemoryStore::new();
        let scheduled = insert(&store, Participant::Him, None, now(), false);

        let thread = reconstruct(&store, scheduled.id).unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, scheduled.id);
    }

    #[test]
    fn orphan_reply_becomes_its_own_root() {
        let store = MemoryStore::new();
        // Parent deleted out from under the reply; the walk fails open.
        let orphan = insert(&store, Participant::Her, Some(Uuid::new_v4()), now(), true);

        let thread = reconstruct(&store, orphan.id).unwrap();
        assert_eq!(thread.iter().map(|l| l.id).collect::<Vec<_>>(), vec![orphan.id]);
    }

    #[test]
    fn reply_cycle_terminates() {
        let store = MemoryStore::new();
        // Forge a two-letter cycle directly in the store. Compose can't
        // create this; the visited set has to cope anyway.
        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        let a = Letter {
            id: a_id,
            sender_id: Participant::Him,
            title: None,
            content: "a".to_string(),
            reply_to: Some(b_id),
            scheduled_delivery_at: None,
            delivered_at: Some(now()),
            read_at: None,
            created_at: now(),
        };
        let b = Letter {
            reply_to: Some(a_id),
            id: b_id,
            sender_id: Participant::Her,
            content: "b".to_string(),
            created_at: now() + Duration::hours(1),
            delivered_at: Some(now() + Duration::hours(1)),
            title: None,
            scheduled_delivery_at: None,
            read_at: None,
        };
        store.insert_letter(&a).unwrap();
        store.insert_letter(&b).unwrap();

        let thread = reconstruct(&store, a_id).unwrap();
        assert_eq!(thread.len(), 2);
    }
}
