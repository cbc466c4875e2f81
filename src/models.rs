//! Typed schema of a Messenger/Instagram chunk file.
//!
//! A chunk file (`message_1.json`, `message_2.json`, ...) holds the thread
//! metadata, the participant roster and a slice of the messages. Every
//! optional sub-record is decoded once here; absent fields become `None` or
//! an empty list.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One decoded chunk file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawDocument {
    pub title: String,
    pub thread_type: String,
    pub thread_path: String,
    pub participants: Vec<RosterEntry>,
    pub messages: Vec<MessageRecord>,
}

impl RawDocument {
    /// Returns the thread metadata that must agree across chunks.
    pub fn metadata(&self) -> ThreadMetadata {
        ThreadMetadata {
            title: self.title.clone(),
            thread_type: self.thread_type.clone(),
            thread_path: self.thread_path.clone(),
        }
    }
}

/// Identity of a thread, adopted from the first chunk of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    pub title: String,
    pub thread_type: String,
    pub thread_path: String,
}

/// Entry of a chunk's `participants` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RosterEntry {
    pub name: String,
}

/// A single message as exported.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageRecord {
    pub sender_name: String,
    pub timestamp_ms: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reactions: Vec<ReactionRecord>,
    #[serde(default)]
    pub photos: Vec<MediaRecord>,
    #[serde(default)]
    pub videos: Vec<MediaRecord>,
    #[serde(default)]
    pub files: Vec<MediaRecord>,
    #[serde(default)]
    pub audio_files: Vec<MediaRecord>,
    #[serde(default)]
    pub gifs: Vec<MediaRecord>,
    #[serde(default)]
    pub share: Option<ShareRecord>,
    #[serde(default)]
    pub sticker: Option<StickerRecord>,
}

impl MessageRecord {
    /// Send time in whole seconds (floor of the millisecond timestamp).
    pub fn timestamp_s(&self) -> i64 {
        self.timestamp_ms.div_euclid(1000)
    }

    /// Send time as a UTC datetime, if representable.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        parse_ms_timestamp(self.timestamp_ms)
    }

    /// Returns the attachments of one kind.
    pub fn attachments(&self, kind: AttachmentKind) -> &[MediaRecord] {
        match kind {
            AttachmentKind::Photo => &self.photos,
            AttachmentKind::Video => &self.videos,
            AttachmentKind::File => &self.files,
            AttachmentKind::Audio => &self.audio_files,
            AttachmentKind::Gif => &self.gifs,
        }
    }

    /// Total number of attachments across all kinds.
    pub fn attachment_count(&self) -> usize {
        AttachmentKind::ALL
            .iter()
            .map(|&kind| self.attachments(kind).len())
            .sum()
    }
}

/// A reaction left on a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReactionRecord {
    pub reaction: String,
    pub actor: String,
}

/// A photo, video, file, audio clip or gif reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MediaRecord {
    pub uri: String,
}

impl MediaRecord {
    /// Final path segment of the URI, which is what gets stored.
    pub fn filename(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }
}

/// A shared link, optionally with text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ShareRecord {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub share_text: Option<String>,
}

/// A sticker. Stickers may live outside the conversation directory, so the
/// full path is kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StickerRecord {
    pub uri: String,
}

/// The five attachment kinds, each stored in its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Photo,
    Video,
    File,
    Audio,
    Gif,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 5] = [
        AttachmentKind::Photo,
        AttachmentKind::Video,
        AttachmentKind::File,
        AttachmentKind::Audio,
        AttachmentKind::Gif,
    ];

    /// Table name, identical to the JSON field name.
    pub fn table(self) -> &'static str {
        match self {
            AttachmentKind::Photo => "photos",
            AttachmentKind::Video => "videos",
            AttachmentKind::File => "files",
            AttachmentKind::Audio => "audio_files",
            AttachmentKind::Gif => "gifs",
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Parses a millisecond timestamp to DateTime.
pub fn parse_ms_timestamp(timestamp_ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(timestamp_ms).single()
}
