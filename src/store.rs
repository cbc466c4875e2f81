//! SQLite persistence for conversations.
//!
//! Tables:
//!
//! ```text
//! conversations(id, title, type, path)
//! participants(id, convo_id, name, current)
//! messages(id, timestamp_s, type, sender_id, conversation_id, content)
//! reactions(message_id, user_id, reaction)
//! photos | videos | files | audio_files | gifs (message_id, filename)
//! shares(message_id, link, share_text)
//! stickers(message_id, path)
//! ```
//!
//! Participant and message ids are generated by SQLite. A conversation is
//! written in a single transaction, so it is either fully present or absent.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, Transaction, params};

use crate::conversation::Conversation;
use crate::error::{ChatdbError, Result};
use crate::models::{AttachmentKind, MessageRecord, ThreadMetadata};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    type TEXT NOT NULL,
    path TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participants (
    id INTEGER PRIMARY KEY,
    convo_id INTEGER NOT NULL REFERENCES conversations(id),
    name TEXT NOT NULL,
    current INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_participants_convo ON participants(convo_id);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY,
    timestamp_s INTEGER NOT NULL,
    type TEXT NOT NULL,
    sender_id INTEGER NOT NULL REFERENCES participants(id),
    conversation_id INTEGER NOT NULL REFERENCES conversations(id),
    content TEXT
);
CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, timestamp_s);

CREATE TABLE IF NOT EXISTS reactions (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    user_id INTEGER NOT NULL REFERENCES participants(id),
    reaction TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS photos (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    filename TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS videos (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    filename TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS files (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    filename TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS audio_files (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    filename TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS gifs (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    filename TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shares (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    link TEXT,
    share_text TEXT
);

CREATE TABLE IF NOT EXISTS stickers (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    path TEXT NOT NULL
);
"#;

/// Every table owned by the store, children before parents.
pub const TABLES: [&str; 11] = [
    "reactions",
    "photos",
    "videos",
    "files",
    "audio_files",
    "gifs",
    "shares",
    "stickers",
    "messages",
    "participants",
    "conversations",
];

/// Rows written for one conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub participants: usize,
    pub messages: usize,
    pub reactions: usize,
    pub attachments: usize,
    pub shares: usize,
    pub stickers: usize,
}

impl std::ops::AddAssign for PersistStats {
    fn add_assign(&mut self, other: Self) {
        self.participants += other.participants;
        self.messages += other.messages;
        self.reactions += other.reactions;
        self.attachments += other.attachments;
        self.shares += other.shares;
        self.stickers += other.stickers;
    }
}

/// A participant row as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantId {
    pub id: i64,
    pub current: bool,
}

/// Name to participant-row mapping for one conversation.
///
/// This is the only place participant ids are handed out. Names missing
/// from the roster get a not-current row on first reference.
#[derive(Debug, Clone, Default)]
pub struct ParticipantIds {
    ids: HashMap<String, ParticipantId>,
}

impl ParticipantIds {
    /// Looks up a participant by name.
    pub fn get(&self, name: &str) -> Option<&ParticipantId> {
        self.ids.get(name)
    }

    fn insert(
        &mut self,
        tx: &Transaction<'_>,
        convo_id: i64,
        name: &str,
        current: bool,
    ) -> rusqlite::Result<i64> {
        tx.execute(
            "INSERT INTO participants (convo_id, name, current) VALUES (?1, ?2, ?3)",
            params![convo_id, name, current],
        )?;
        let id = tx.last_insert_rowid();
        self.ids.insert(name.to_string(), ParticipantId { id, current });
        Ok(id)
    }

    fn resolve(&mut self, tx: &Transaction<'_>, convo_id: i64, name: &str) -> rusqlite::Result<i64> {
        match self.ids.get(name) {
            Some(p) => Ok(p.id),
            None => self.insert(tx, convo_id, name, false),
        }
    }
}

/// Result of persisting a conversation.
#[derive(Debug, Clone)]
pub struct Persisted {
    pub stats: PersistStats,
    pub participants: ParticipantIds,
}

/// Database handle for the normalized export.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens or creates a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            ChatdbError::persistence(format!("opening {}", path.as_ref().display()), e)
        })?;
        Self::init(conn)
    }

    /// Creates an in-memory database.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ChatdbError::persistence("opening in-memory database", e))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| ChatdbError::persistence("enabling foreign keys", e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| ChatdbError::persistence("creating schema", e))?;
        Ok(Self { conn })
    }

    /// Deletes every row from every table.
    pub fn clear_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for table in TABLES {
            tx.execute(&format!("DELETE FROM {table}"), [])
                .map_err(|e| ChatdbError::persistence(format!("clearing {table}"), e))?;
        }
        tx.commit()
            .map_err(|e| ChatdbError::persistence("committing clear", e))
    }

    /// Writes a conversation with all participants, messages and sub-records.
    ///
    /// Runs in one transaction: on error nothing of this conversation is
    /// left in the database.
    pub fn persist(&mut self, conversation: &Conversation) -> Result<Persisted> {
        let context = format!(
            "saving conversation #{} ({})",
            conversation.id(),
            conversation.directory().display()
        );
        let metadata = conversation
            .metadata()
            .ok_or_else(|| ChatdbError::empty_conversation(conversation.directory()))?;
        self.write_conversation(conversation, metadata)
            .map_err(|e| ChatdbError::persistence(context, e))
    }

    fn write_conversation(
        &mut self,
        conversation: &Conversation,
        metadata: &ThreadMetadata,
    ) -> rusqlite::Result<Persisted> {
        let convo_id = conversation.id();
        let mut stats = PersistStats::default();
        let mut participants = ParticipantIds::default();

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO conversations (id, title, type, path) VALUES (?1, ?2, ?3, ?4)",
            params![
                convo_id,
                metadata.title,
                metadata.thread_type,
                metadata.thread_path
            ],
        )?;

        for participant in conversation.roster() {
            participants.insert(&tx, convo_id, &participant.name, true)?;
        }

        for message in conversation.messages() {
            write_message(&tx, convo_id, message, &mut participants, &mut stats)?;
        }

        tx.commit()?;

        stats.participants = participants.ids.len();
        Ok(Persisted {
            stats,
            participants,
        })
    }

    /// Counts the rows of one of the store's tables.
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        if !TABLES.contains(&table) {
            return Err(ChatdbError::persistence(
                format!("counting rows of unknown table {table}"),
                rusqlite::Error::InvalidQuery,
            ));
        }
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Returns the id one past the highest stored conversation id, or 0 for
    /// an empty store.
    pub fn next_conversation_id(&self) -> Result<i64> {
        let next = self.conn.query_row(
            "SELECT COALESCE(MAX(id) + 1, 0) FROM conversations",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Borrows the underlying connection for ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn write_message(
    tx: &Transaction<'_>,
    convo_id: i64,
    message: &MessageRecord,
    participants: &mut ParticipantIds,
    stats: &mut PersistStats,
) -> rusqlite::Result<()> {
    let sender_id = participants.resolve(tx, convo_id, &message.sender_name)?;

    tx.execute(
        "INSERT INTO messages (timestamp_s, type, sender_id, conversation_id, content)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.timestamp_s(),
            message.kind,
            sender_id,
            convo_id,
            message.content
        ],
    )?;
    let message_id = tx.last_insert_rowid();
    stats.messages += 1;

    for reaction in &message.reactions {
        let user_id = participants.resolve(tx, convo_id, &reaction.actor)?;
        tx.execute(
            "INSERT INTO reactions (message_id, user_id, reaction) VALUES (?1, ?2, ?3)",
            params![message_id, user_id, reaction.reaction],
        )?;
        stats.reactions += 1;
    }

    for kind in AttachmentKind::ALL {
        for media in message.attachments(kind) {
            tx.execute(
                &format!("INSERT INTO {} (message_id, filename) VALUES (?1, ?2)", kind.table()),
                params![message_id, media.filename()],
            )?;
            stats.attachments += 1;
        }
    }

    if let Some(share) = &message.share {
        tx.execute(
            "INSERT INTO shares (message_id, link, share_text) VALUES (?1, ?2, ?3)",
            params![message_id, share.link, share.share_text],
        )?;
        stats.shares += 1;
    }

    if let Some(sticker) = &message.sticker {
        tx.execute(
            "INSERT INTO stickers (message_id, path) VALUES (?1, ?2)",
            params![message_id, sticker.uri],
        )?;
        stats.stickers += 1;
    }

    Ok(())
}
