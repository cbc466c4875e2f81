//! Folding chunk files into one conversation.
//!
//! A conversation directory may hold several chunk files. Each one repeats
//! the thread metadata and carries a contiguous slice of messages.
//! [`Conversation::merge`] adopts the metadata of the first chunk, checks
//! every later chunk against it, and appends messages in chunk order.
//!
//! Participants are only registered here, never given ids. Ids come from
//! the store when the conversation is persisted (see
//! [`crate::store::ParticipantIds`]).

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{ChatdbError, Result};
use crate::models::{MessageRecord, RawDocument, ThreadMetadata};

/// A participant known before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    /// `true` if listed in the export roster, `false` if only seen as a
    /// sender or reactor.
    pub current: bool,
}

/// A conversation assembled from one or more chunk files.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: i64,
    directory: PathBuf,
    metadata: Option<ThreadMetadata>,
    roster: Vec<Participant>,
    messages: Vec<MessageRecord>,
    chunks_loaded: usize,
}

impl Conversation {
    /// Creates an empty conversation for `directory` with surrogate `id`.
    pub fn new(id: i64, directory: impl Into<PathBuf>) -> Self {
        Self {
            id,
            directory: directory.into(),
            metadata: None,
            roster: Vec::new(),
            messages: Vec::new(),
            chunks_loaded: 0,
        }
    }

    /// Folds one chunk into the conversation.
    ///
    /// The first chunk sets the metadata and the roster. Later chunks must
    /// carry identical metadata; their rosters are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ChatdbError::Integrity`] if the chunk's title, thread type
    /// or thread path differs from the first chunk. The conversation is left
    /// unchanged in that case.
    pub fn merge(&mut self, document: RawDocument) -> Result<()> {
        let candidate = document.metadata();

        match &self.metadata {
            None => {
                let mut seen = HashSet::new();
                for entry in document.participants {
                    if seen.insert(entry.name.clone()) {
                        self.roster.push(Participant {
                            name: entry.name,
                            current: true,
                        });
                    }
                }
                self.metadata = Some(candidate);
            }
            Some(existing) => self.check_metadata(existing, &candidate)?,
        }

        self.messages.extend(document.messages);
        self.chunks_loaded += 1;
        Ok(())
    }

    fn check_metadata(&self, existing: &ThreadMetadata, candidate: &ThreadMetadata) -> Result<()> {
        let fields = [
            ("title", &existing.title, &candidate.title),
            ("thread_type", &existing.thread_type, &candidate.thread_type),
            ("thread_path", &existing.thread_path, &candidate.thread_path),
        ];
        for (field, expected, found) in fields {
            if expected != found {
                return Err(ChatdbError::integrity(
                    &self.directory,
                    field,
                    expected.as_str(),
                    found.as_str(),
                ));
            }
        }
        Ok(())
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Thread metadata, `None` until the first chunk is merged.
    pub fn metadata(&self) -> Option<&ThreadMetadata> {
        self.metadata.as_ref()
    }

    /// Roster participants, in roster order.
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// Messages in chunk-append order.
    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    pub fn chunks_loaded(&self) -> usize {
        self.chunks_loaded
    }

    /// Earliest and latest send time across all messages.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut times = self.messages.iter().filter_map(|m| m.sent_at());
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

impl fmt::Display for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conversation stored at {} with {} loaded files and {} participants",
            self.directory.display(),
            self.chunks_loaded,
            self.roster.len()
        )
    }
}
