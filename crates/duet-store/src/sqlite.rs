use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;
use uuid::Uuid;

use duet_types::models::{
    Comment, CountdownEvent, DailyLocation, Letter, Like, MediaObject, Memory, MemoryWithStats,
    PairedDay, Participant, VoiceMessage,
};

use crate::rows::{CommentRow, CountdownRow, LetterRow, LikeRow, LocationRow, MediaRow, MemoryRow, VoiceRow};
use crate::time::encode_ts;
use crate::{LetterScope, Store, StoreError};

const LETTER_COLS: &str =
    "id, sender_id, title, content, reply_to, scheduled_delivery_at, delivered_at, read_at, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        run_migrations(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }
}

fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE letters (
                id                      TEXT PRIMARY KEY,
                sender_id               TEXT NOT NULL CHECK (sender_id IN ('him', 'her')),
                title                   TEXT,
                content                 TEXT NOT NULL,
                reply_to                TEXT,
                scheduled_delivery_at   TEXT,
                delivered_at            TEXT,
                read_at                 TEXT,
                created_at              TEXT NOT NULL
            );

            CREATE INDEX idx_letters_reply
                ON letters(reply_to, created_at);
            CREATE INDEX idx_letters_created
                ON letters(created_at);

            CREATE TABLE daily_locations (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL CHECK (user_id IN ('him', 'her')),
                latitude    REAL NOT NULL,
                longitude   REAL NOT NULL,
                mood_emoji  TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_locations_user_day
                ON daily_locations(user_id, created_at);

            CREATE TABLE memories (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL CHECK (user_id IN ('him', 'her')),
                image_url   TEXT NOT NULL,
                description TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_memories_created
                ON memories(created_at);

            CREATE TABLE likes (
                id          TEXT PRIMARY KEY,
                memory_id   TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
                user_id     TEXT NOT NULL CHECK (user_id IN ('him', 'her')),
                created_at  TEXT NOT NULL,
                UNIQUE(memory_id, user_id)
            );

            CREATE TABLE comments (
                id                  TEXT PRIMARY KEY,
                memory_id           TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
                user_id             TEXT NOT NULL CHECK (user_id IN ('him', 'her')),
                content             TEXT NOT NULL,
                parent_comment_id   TEXT REFERENCES comments(id) ON DELETE CASCADE,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_comments_memory
                ON comments(memory_id, created_at);

            CREATE TABLE countdown_events (
                id                      TEXT PRIMARY KEY,
                title                   TEXT NOT NULL,
                target_date             TEXT NOT NULL,
                background_image_url    TEXT,
                created_at              TEXT NOT NULL,
                updated_at              TEXT NOT NULL
            );

            CREATE TABLE voice_messages (
                id              TEXT PRIMARY KEY,
                sender_id       TEXT NOT NULL CHECK (sender_id IN ('him', 'her')),
                recipient_id    TEXT NOT NULL CHECK (recipient_id IN ('him', 'her')),
                audio_url       TEXT NOT NULL,
                duration        REAL NOT NULL,
                is_read         INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_voice_created
                ON voice_messages(created_at);

            CREATE TABLE media_objects (
                id              TEXT PRIMARY KEY,
                owner_id        TEXT NOT NULL CHECK (owner_id IN ('him', 'her')),
                content_type    TEXT NOT NULL,
                size_bytes      INTEGER NOT NULL,
                created_at      TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    Ok(())
}

fn letter_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LetterRow> {
    Ok(LetterRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        reply_to: row.get(4)?,
        scheduled_delivery_at: row.get(5)?,
        delivered_at: row.get(6)?,
        read_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn query_letters<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<Letter>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, letter_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(LetterRow::into_letter).collect()
}

impl Store for SqliteStore {
    // -- Letters --

    fn insert_letter(&self, letter: &Letter) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO letters (id, sender_id, title, content, reply_to,
                     scheduled_delivery_at, delivered_at, read_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    letter.id.to_string(),
                    letter.sender_id.as_str(),
                    letter.title,
                    letter.content,
                    letter.reply_to.map(|id| id.to_string()),
                    letter.scheduled_delivery_at.map(encode_ts),
                    letter.delivered_at.map(encode_ts),
                    letter.read_at.map(encode_ts),
                    encode_ts(letter.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn letter(&self, id: Uuid) -> Result<Option<Letter>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM letters WHERE id = ?1", LETTER_COLS),
                    [id.to_string()],
                    letter_from_row,
                )
                .optional()?;
            row.map(LetterRow::into_letter).transpose()
        })
    }

    fn list_letters(
        &self,
        scope: LetterScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Letter>, StoreError> {
        self.with_conn(|conn| match scope {
            LetterScope::Inbox(viewer) => query_letters(
                conn,
                &format!(
                    "SELECT {} FROM letters
                     WHERE sender_id = ?1 AND delivered_at IS NOT NULL
                     ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                    LETTER_COLS
                ),
                params![viewer.other().as_str(), limit, offset],
            ),
            LetterScope::Sent(sender) => query_letters(
                conn,
                &format!(
                    "SELECT {} FROM letters
                     WHERE sender_id = ?1
                     ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                    LETTER_COLS
                ),
                params![sender.as_str(), limit, offset],
            ),
            LetterScope::All => query_letters(
                conn,
                &format!(
                    "SELECT {} FROM letters
                     WHERE delivered_at IS NOT NULL
                     ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                    LETTER_COLS
                ),
                params![limit, offset],
            ),
        })
    }

    fn count_letters(&self, scope: LetterScope) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = match scope {
                LetterScope::Inbox(viewer) => conn.query_row(
                    "SELECT COUNT(*) FROM letters
                     WHERE sender_id = ?1 AND delivered_at IS NOT NULL",
                    [viewer.other().as_str()],
                    |r| r.get(0),
                )?,
                LetterScope::Sent(sender) => conn.query_row(
                    "SELECT COUNT(*) FROM letters WHERE sender_id = ?1",
                    [sender.as_str()],
                    |r| r.get(0),
                )?,
                LetterScope::All => conn.query_row(
                    "SELECT COUNT(*) FROM letters WHERE delivered_at IS NOT NULL",
                    [],
                    |r| r.get(0),
                )?,
            };
            Ok(count as u64)
        })
    }

    fn count_unread_letters(&self, viewer: Participant) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM letters
                 WHERE sender_id = ?1 AND delivered_at IS NOT NULL AND read_at IS NULL",
                [viewer.other().as_str()],
                |r| r.get(0),
            )?;
            Ok(count as u64)
        })
    }

    fn delivered_replies(&self, parent: Uuid) -> Result<Vec<Letter>, StoreError> {
        self.with_conn(|conn| {
            query_letters(
                conn,
                &format!(
                    "SELECT {} FROM letters
                     WHERE reply_to = ?1 AND delivered_at IS NOT NULL
                     ORDER BY created_at ASC",
                    LETTER_COLS
                ),
                [parent.to_string()],
            )
        })
    }

    fn deliver_due_letters(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let ts = encode_ts(now);
            let changed = conn.execute(
                "UPDATE letters SET delivered_at = ?1
                 WHERE delivered_at IS NULL
                   AND scheduled_delivery_at IS NOT NULL
                   AND scheduled_delivery_at <= ?1",
                [ts],
            )?;
            Ok(changed)
        })
    }

    fn mark_letter_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE letters SET read_at = ?1 WHERE id = ?2 AND read_at IS NULL",
                params![encode_ts(at), id.to_string()],
            )?;
            Ok(())
        })
    }

    fn delete_letter(&self, id: Uuid, sender: Participant) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM letters WHERE id = ?1 AND sender_id = ?2",
                params![id.to_string(), sender.as_str()],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Daily locations --

    fn insert_location(&self, location: &DailyLocation) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO daily_locations (id, user_id, latitude, longitude, mood_emoji, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    location.id.to_string(),
                    location.user_id.as_str(),
                    location.latitude,
                    location.longitude,
                    location.mood_emoji,
                    encode_ts(location.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn location_on_day(
        &self,
        user: Participant,
        day: NaiveDate,
    ) -> Result<Option<DailyLocation>, StoreError> {
        self.with_conn(|conn| {
            // created_at is fixed-width RFC3339, so the first ten characters
            // are the UTC date.
            let row = conn
                .query_row(
                    "SELECT id, user_id, latitude, longitude, mood_emoji, created_at
                     FROM daily_locations
                     WHERE user_id = ?1 AND substr(created_at, 1, 10) = ?2",
                    params![user.as_str(), day.format("%Y-%m-%d").to_string()],
                    |row| {
                        Ok(LocationRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            latitude: row.get(2)?,
                            longitude: row.get(3)?,
                            mood_emoji: row.get(4)?,
                            created_at: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            row.map(LocationRow::into_location).transpose()
        })
    }

    fn paired_location_days(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PairedDay>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT substr(h.created_at, 1, 10) AS day,
                        h.id, h.latitude, h.longitude, h.mood_emoji, h.created_at,
                        r.id, r.latitude, r.longitude, r.mood_emoji, r.created_at
                 FROM daily_locations h
                 JOIN daily_locations r
                   ON substr(h.created_at, 1, 10) = substr(r.created_at, 1, 10)
                 WHERE h.user_id = 'him' AND r.user_id = 'her'
                 ORDER BY day DESC
                 LIMIT ?1 OFFSET ?2",
            )?;

            let raw = stmt
                .query_map(params![limit, offset], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        LocationRow {
                            id: row.get(1)?,
                            user_id: "him".into(),
                            latitude: row.get(2)?,
                            longitude: row.get(3)?,
                            mood_emoji: row.get(4)?,
                            created_at: row.get(5)?,
                        },
                        LocationRow {
                            id: row.get(6)?,
                            user_id: "her".into(),
                            latitude: row.get(7)?,
                            longitude: row.get(8)?,
                            mood_emoji: row.get(9)?,
                            created_at: row.get(10)?,
                        },
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            raw.into_iter()
                .map(|(day, him, her)| {
                    let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                        .map_err(|e| StoreError::Corrupt(format!("bad day '{}': {}", day, e)))?;
                    Ok(PairedDay {
                        date,
                        him: him.into_location()?,
                        her: her.into_location()?,
                    })
                })
                .collect()
        })
    }

    // -- Memories --

    fn insert_memory(&self, memory: &Memory) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO memories (id, user_id, image_url, description, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    memory.id.to_string(),
                    memory.user_id.as_str(),
                    memory.image_url,
                    memory.description,
                    encode_ts(memory.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn memory(&self, id: Uuid) -> Result<Option<Memory>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, image_url, description, created_at
                     FROM memories WHERE id = ?1",
                    [id.to_string()],
                    |row| {
                        Ok(MemoryRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            image_url: row.get(2)?,
                            description: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            row.map(MemoryRow::into_memory).transpose()
        })
    }

    fn list_memories(&self, limit: u32, offset: u32) -> Result<Vec<MemoryWithStats>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.user_id, m.image_url, m.description, m.created_at,
                        (SELECT COUNT(*) FROM likes l WHERE l.memory_id = m.id),
                        (SELECT COUNT(*) FROM comments c WHERE c.memory_id = m.id),
                        EXISTS(SELECT 1 FROM likes l WHERE l.memory_id = m.id AND l.user_id = 'him'),
                        EXISTS(SELECT 1 FROM likes l WHERE l.memory_id = m.id AND l.user_id = 'her')
                 FROM memories m
                 ORDER BY m.created_at DESC
                 LIMIT ?1 OFFSET ?2",
            )?;

            let raw = stmt
                .query_map(params![limit, offset], |row| {
                    Ok((
                        MemoryRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            image_url: row.get(2)?,
                            description: row.get(3)?,
                            created_at: row.get(4)?,
                        },
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, bool>(7)?,
                        row.get::<_, bool>(8)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            raw.into_iter()
                .map(|(row, likes, comments, by_him, by_her)| {
                    Ok(MemoryWithStats {
                        memory: row.into_memory()?,
                        like_count: likes as u64,
                        comment_count: comments as u64,
                        liked_by_him: by_him,
                        liked_by_her: by_her,
                    })
                })
                .collect()
        })
    }

    fn count_memories(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |r| r.get(0))?;
            Ok(count as u64)
        })
    }

    // -- Likes --

    fn toggle_like(
        &self,
        id: Uuid,
        memory_id: Uuid,
        user: Participant,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM likes WHERE memory_id = ?1 AND user_id = ?2",
                    params![memory_id.to_string(), user.as_str()],
                    |r| r.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM likes WHERE id = ?1", [existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO likes (id, memory_id, user_id, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        id.to_string(),
                        memory_id.to_string(),
                        user.as_str(),
                        encode_ts(now),
                    ],
                )?;
                Ok(true)
            }
        })
    }

    fn likes_for_memory(&self, memory_id: Uuid) -> Result<Vec<Like>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, memory_id, user_id, created_at
                 FROM likes WHERE memory_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map([memory_id.to_string()], |row| {
                    Ok(LikeRow {
                        id: row.get(0)?,
                        memory_id: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(LikeRow::into_like).collect()
        })
    }

    // -- Comments --

    fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, memory_id, user_id, content, parent_comment_id,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    comment.id.to_string(),
                    comment.memory_id.to_string(),
                    comment.user_id.as_str(),
                    comment.content,
                    comment.parent_comment_id.map(|id| id.to_string()),
                    encode_ts(comment.created_at),
                    encode_ts(comment.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    fn comment(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, memory_id, user_id, content, parent_comment_id, created_at, updated_at
                     FROM comments WHERE id = ?1",
                    [id.to_string()],
                    comment_from_row,
                )
                .optional()?;
            row.map(CommentRow::into_comment).transpose()
        })
    }

    fn list_comments(&self, memory_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, memory_id, user_id, content, parent_comment_id, created_at, updated_at
                 FROM comments WHERE memory_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt
                .query_map([memory_id.to_string()], comment_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(CommentRow::into_comment).collect()
        })
    }

    fn update_comment(
        &self,
        id: Uuid,
        user: Participant,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?1, updated_at = ?2
                 WHERE id = ?3 AND user_id = ?4",
                params![content, encode_ts(now), id.to_string(), user.as_str()],
            )?;
            Ok(changed > 0)
        })
    }

    fn delete_comment(&self, id: Uuid, user: Participant) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            // Replies are removed by the ON DELETE CASCADE on parent_comment_id.
            let changed = conn.execute(
                "DELETE FROM comments WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user.as_str()],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Countdown events --

    fn insert_countdown(&self, event: &CountdownEvent) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO countdown_events (id, title, target_date, background_image_url,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.id.to_string(),
                    event.title,
                    encode_ts(event.target_date),
                    event.background_image_url,
                    encode_ts(event.created_at),
                    encode_ts(event.updated_at),
                ],
            )?;
            Ok(())
        })
    }

    fn countdown(&self, id: Uuid) -> Result<Option<CountdownEvent>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, target_date, background_image_url, created_at, updated_at
                     FROM countdown_events WHERE id = ?1",
                    [id.to_string()],
                    countdown_from_row,
                )
                .optional()?;
            row.map(CountdownRow::into_event).transpose()
        })
    }

    fn list_countdowns(&self) -> Result<Vec<CountdownEvent>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, target_date, background_image_url, created_at, updated_at
                 FROM countdown_events ORDER BY target_date ASC",
            )?;
            let rows = stmt
                .query_map([], countdown_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(CountdownRow::into_event).collect()
        })
    }

    fn count_future_countdowns(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM countdown_events WHERE target_date > ?1",
                [encode_ts(now)],
                |r| r.get(0),
            )?;
            Ok(count as u64)
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
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE countdown_events
                 SET title = ?1, target_date = ?2, background_image_url = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    title,
                    encode_ts(target_date),
                    background_image_url,
                    encode_ts(now),
                    id.to_string(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    fn delete_countdown(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM countdown_events WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    fn delete_all_countdowns(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM countdown_events", [])?;
            Ok(changed)
        })
    }

    // -- Voice messages --

    fn insert_voice_message(&self, message: &VoiceMessage) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO voice_messages (id, sender_id, recipient_id, audio_url, duration,
                     is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    message.id.to_string(),
                    message.sender_id.as_str(),
                    message.recipient_id.as_str(),
                    message.audio_url,
                    message.duration,
                    message.is_read,
                    encode_ts(message.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn voice_message(&self, id: Uuid) -> Result<Option<VoiceMessage>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, sender_id, recipient_id, audio_url, duration, is_read, created_at
                     FROM voice_messages WHERE id = ?1",
                    [id.to_string()],
                    voice_from_row,
                )
                .optional()?;
            row.map(VoiceRow::into_message).transpose()
        })
    }

    fn list_voice_messages(&self) -> Result<Vec<VoiceMessage>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, recipient_id, audio_url, duration, is_read, created_at
                 FROM voice_messages ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], voice_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(VoiceRow::into_message).collect()
        })
    }

    fn mark_voice_read(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE voice_messages SET is_read = 1 WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    fn delete_voice_message(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM voice_messages WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }

    // -- Media objects --

    fn insert_media(&self, media: &MediaObject) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO media_objects (id, owner_id, content_type, size_bytes, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    media.id.to_string(),
                    media.owner_id.as_str(),
                    media.content_type,
                    media.size_bytes as i64,
                    encode_ts(media.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn media(&self, id: Uuid) -> Result<Option<MediaObject>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, owner_id, content_type, size_bytes, created_at
                     FROM media_objects WHERE id = ?1",
                    [id.to_string()],
                    |row| {
                        Ok(MediaRow {
                            id: row.get(0)?,
                            owner_id: row.get(1)?,
                            content_type: row.get(2)?,
                            size_bytes: row.get(3)?,
                            created_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            row.map(MediaRow::into_media).transpose()
        })
    }

    fn delete_media(&self, id: Uuid) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM media_objects WHERE id = ?1", [id.to_string()])?;
            Ok(changed > 0)
        })
    }
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        memory_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        parent_comment_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn countdown_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CountdownRow> {
    Ok(CountdownRow {
        id: row.get(0)?,
        title: row.get(1)?,
        target_date: row.get(2)?,
        background_image_url: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn voice_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VoiceRow> {
    Ok(VoiceRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        audio_url: row.get(3)?,
        duration: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}
