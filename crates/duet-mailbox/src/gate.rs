//! The delivery gate: decides a letter's initial visibility at compose time
//! and promotes due scheduled letters when anyone reads the mailbox. There
//! is no background timer; the sweep rides along with list/thread reads.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use duet_store::Store;
use duet_types::models::{Letter, Participant};

use crate::MailboxError;

pub const MAX_CONTENT_CHARS: usize = 2000;
pub const MAX_TITLE_CHARS: usize = 100;

/// Compose-time input, already past HTTP deserialization.
#[derive(Debug, Clone)]
pub struct Compose {
    pub title: Option<String>,
    pub content: String,
    pub scheduled_delivery_at: Option<DateTime<Utc>>,
    pub reply_to: Option<Uuid>,
}

/// Validate and persist a new letter. No schedule means delivered at `now`;
/// a strictly-future schedule means the letter is stored undelivered until a
/// sweep promotes it.
pub fn compose(
    store: &dyn Store,
    sender: Participant,
    input: Compose,
    now: DateTime<Utc>,
) -> Result<Letter, MailboxError> {
    let content = input.content.trim().to_string();
    if content.is_empty() {
        return Err(MailboxError::Validation(
            "letter content cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(MailboxError::Validation(format!(
            "letter content cannot exceed {} characters",
            MAX_CONTENT_CHARS
        )));
    }

    let title = input
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if let Some(t) = &title
        && t.chars().count() > MAX_TITLE_CHARS
    {
        return Err(MailboxError::Validation(format!(
            "title cannot exceed {} characters",
            MAX_TITLE_CHARS
        )));
    }

    if let Some(parent_id) = input.reply_to {
        let parent = store.letter(parent_id)?.ok_or_else(|| {
            MailboxError::Validation("the letter being replied to does not exist".to_string())
        })?;
        if parent.sender_id == sender {
            return Err(MailboxError::Validation(
                "cannot reply to your own letter".to_string(),
            ));
        }
    }

    let (scheduled_delivery_at, delivered_at) = match input.scheduled_delivery_at {
        Some(at) if at <= now => {
            return Err(MailboxError::Validation(
                "scheduled delivery time must be in the future".to_string(),
            ));
        }
        Some(at) => (Some(at), None),
        None => (None, Some(now)),
    };

    let letter = Letter {
        id: Uuid::new_v4(),
        sender_id: sender,
        title,
        content,
        reply_to: input.reply_to,
        scheduled_delivery_at,
        delivered_at,
        read_at: None,
        created_at: now,
    };
    store.insert_letter(&letter)?;
    Ok(letter)
}

/// Promote every due scheduled letter. Best-effort: a sweep failure is
/// logged and swallowed so it never blocks the read that triggered it.
pub fn sweep_due(store: &dyn Store, now: DateTime<Utc>) {
    match store.deliver_due_letters(now) {
        Ok(0) => {}
        Ok(n) => debug!("delivered {} scheduled letter(s)", n),
        Err(e) => warn!("scheduled letter sweep failed: {}", e),
    }
}

/// Mark a delivered letter read. Recipient-only, and set-once: a second call
/// keeps the original read timestamp.
pub fn mark_read(
    store: &dyn Store,
    id: Uuid,
    viewer: Participant,
    now: DateTime<Utc>,
) -> Result<Letter, MailboxError> {
    let letter = store.letter(id)?.ok_or(MailboxError::NotFound)?;
    if letter.sender_id == viewer {
        return Err(MailboxError::Permission(
            "only the recipient can mark a letter read".to_string(),
        ));
    }
    if letter.delivered_at.is_none() {
        return Err(MailboxError::Validation(
            "letter has not been delivered yet".to_string(),
        ));
    }

    store.mark_letter_read(id, now)?;
    store.letter(id)?.ok_or(MailboxError::NotFound)
}

/// Delete a letter. Sender-only; replies to it are left in place, each
/// becoming the root of its own thread.
pub fn delete_letter(
    store: &dyn Store,
    id: Uuid,
    requester: Participant,
) -> Result<(), MailboxError> {
    let letter = store.letter(id)?.ok_or(MailboxError::NotFound)?;
    if letter.sender_id != requester {
        return Err(MailboxError::Permission(
            "only the sender can delete a letter".to_string(),
        ));
    }
    store.delete_letter(id, requester)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use duet_store::{LetterScope, MemoryStore};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn plain(content: &str) -> Compose {
        Compose {
            title: None,
            content: content.to_string(),
            scheduled_delivery_at: None,
            reply_to: None,
        }
    }

    #[test]
    fn immediate_compose_is_delivered_at_creation() {
        let store = MemoryStore::new();
        let letter = compose(&store, Participant::Him, plain("hi"), now()).unwrap();

        assert_eq!(letter.delivered_at, Some(now()));
        assert_eq!(letter.created_at, now());
        assert!(letter.scheduled_delivery_at.is_none());

        // Instantly visible in the partner's inbox.
        let inbox = store
            .list_letters(LetterScope::Inbox(Participant::Her), 10, 0)
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, letter.id);
    }

    #[test]
    fn content_is_trimmed_and_required() {
        let store = MemoryStore::new();
        let letter = compose(&store, Participant::Him, plain("  hi  "), now()).unwrap();
        assert_eq!(letter.content, "hi");

        assert!(matches!(
            compose(&store, Participant::Him, plain("   "), now()),
            Err(MailboxError::Validation(_))
        ));
        assert!(matches!(
            compose(&store, Participant::Him, plain(&"x".repeat(2001)), now()),
            Err(MailboxError::Validation(_))
        ));
    }

    #[test]
    fn blank_title_becomes_none_and_long_title_rejected() {
        let store = MemoryStore::new();
        let mut input = plain("hi");
        input.title = Some("   ".to_string());
        let letter = compose(&store, Participant::Him, input, now()).unwrap();
        assert!(letter.title.is_none());

        let mut input = plain("hi");
        input.title = Some("t".repeat(101));
        assert!(matches!(
            compose(&store, Participant::Him, input, now()),
            Err(MailboxError::Validation(_))
        ));
    }

    #[test]
    fn past_or_present_schedule_is_rejected() {
        let store = MemoryStore::new();
        for offset in [Duration::zero(), -Duration::hours(1)] {
            let mut input = plain("hi");
            input.scheduled_delivery_at = Some(now() + offset);
            assert!(matches!(
                compose(&store, Participant::Him, input, now()),
                Err(MailboxError::Validation(_))
            ));
        }
    }

    #[test]
    fn scheduled_letter_waits_for_the_sweep() {
        let store = MemoryStore::new();
        let due = now() + Duration::hours(1);
        let mut input = plain("surprise");
        input.scheduled_delivery_at = Some(due);
        let letter = compose(&store, Participant::Him, input, now()).unwrap();
        assert!(letter.delivered_at.is_none());

        // Before the schedule: sweep is a no-op, inbox stays empty.
        sweep_due(&store, now() + Duration::minutes(30));
        assert!(store
            .list_letters(LetterScope::Inbox(Participant::Her), 10, 0)
            .unwrap()
            .is_empty());

        // At/after the schedule: the next read's sweep delivers it.
        let read_at = due + Duration::minutes(5);
        sweep_due(&store, read_at);
        let inbox = store
            .list_letters(LetterScope::Inbox(Participant::Her), 10, 0)
            .unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].delivered_at, Some(read_at));
    }

    #[test]
    fn reply_must_target_partner_letter() {
        let store = MemoryStore::new();
        let original = compose(&store, Participant::Him, plain("hi"), now()).unwrap();

        // Replying to your own letter is a validation error.
        let mut input = plain("me again");
        input.reply_to = Some(original.id);
        assert!(matches!(
            compose(&store, Participant::Him, input, now()),
            Err(MailboxError::Validation(_))
        ));

        // Missing target likewise.
        let mut input = plain("reply");
        input.reply_to = Some(Uuid::new_v4());
        assert!(matches!(
            compose(&store, Participant::Her, input, now()),
            Err(MailboxError::Validation(_))
        ));

        // The partner can reply.
        let mut input = plain("reply");
        input.reply_to = Some(original.id);
        let reply = compose(&store, Participant::Her, input, now() + Duration::minutes(1)).unwrap();
        assert_eq!(reply.reply_to, Some(original.id));
    }

    #[test]
    fn mark_read_is_recipient_only_and_set_once() {
        let store = MemoryStore::new();
        let letter = compose(&store, Participant::Him, plain("hi"), now()).unwrap();

        assert!(matches!(
            mark_read(&store, letter.id, Participant::Him, now()),
            Err(MailboxError::Permission(_))
        ));

        let first = now() + Duration::hours(1);
        let read = mark_read(&store, letter.id, Participant::Her, first).unwrap();
        assert_eq!(read.read_at, Some(first));

        let again = mark_read(&store, letter.id, Participant::Her, now() + Duration::hours(2)).unwrap();
        assert_eq!(again.read_at, Some(first));
    }

    #[test]
    fn mark_read_requires_delivery() {
        let store = MemoryStore::new();
        let mut input = plain("later");
        input.scheduled_delivery_at = Some(now() + Duration::hours(1));
        let letter = compose(&store, Participant::Him, input, now()).unwrap();

        assert!(matches!(
            mark_read(&store, letter.id, Participant::Her, now()),
            Err(MailboxError::Validation(_))
        ));
    }

    #[test]
    fn delete_is_sender_only() {
        let store = MemoryStore::new();
        let letter = compose(&store, Participant::Him, plain("hi"), now()).unwrap();

        assert!(matches!(
            delete_letter(&store, letter.id, Participant::Her),
            Err(MailboxError::Permission(_))
        ));
        assert!(store.letter(letter.id).unwrap().is_some());

        delete_letter(&store, letter.id, Participant::Him).unwrap();
        assert!(store.letter(letter.id).unwrap().is_none());
        assert!(matches!(
            delete_letter(&store, letter.id, Participant::Him),
            Err(MailboxError::NotFound)
        ));
    }
}
