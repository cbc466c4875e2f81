//! Import runs: export tree in, SQLite database out.
//!
//! A run wipes the database (unless configured otherwise), then for each
//! conversation directory, in name order:
//!
//! 1. assigns the next zero-based conversation id
//! 2. loads every chunk file in chunk order and merges it
//! 3. persists the conversation in one transaction
//!
//! The first error stops the run. Conversations committed before it stay in
//! the database.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatdb::config::ImportConfig;
//! use chatdb::import::Importer;
//! use chatdb::progress::stdout_progress;
//!
//! let summary = Importer::new(ImportConfig::new().with_input_root("messages/inbox"))
//!     .with_progress(stdout_progress())
//!     .run()?;
//! println!("{} messages imported", summary.stats.messages);
//! # Ok::<(), chatdb::ChatdbError>(())
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::ImportConfig;
use crate::conversation::Conversation;
use crate::error::{ChatdbError, Result};
use crate::loader::{discover_chunks, discover_conversations, load_chunk};
use crate::progress::{ImportEvent, ProgressCallback, no_progress};
use crate::store::{PersistStats, Store};

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub conversations: usize,
    pub chunks: usize,
    /// Rows written, summed over all conversations.
    pub stats: PersistStats,
    /// Strings kept unrepaired under the lenient encoding policy.
    pub unrepaired: usize,
    /// Earliest message time across the run.
    pub first_message: Option<DateTime<Utc>>,
    /// Latest message time across the run.
    pub last_message: Option<DateTime<Utc>>,
}

impl ImportSummary {
    fn record(&mut self, conversation: &Conversation, stats: PersistStats) {
        self.conversations += 1;
        self.chunks += conversation.chunks_loaded();
        self.stats += stats;

        if let Some((first, last)) = conversation.time_span() {
            self.first_message = Some(self.first_message.map_or(first, |t| t.min(first)));
            self.last_message = Some(self.last_message.map_or(last, |t| t.max(last)));
        }
    }
}

/// Drives an import run.
pub struct Importer {
    config: ImportConfig,
    progress: ProgressCallback,
}

impl Importer {
    /// Creates an importer with no progress reporting.
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            progress: no_progress(),
        }
    }

    /// Sets the progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Opens the configured database and imports every conversation.
    pub fn run(&self) -> Result<ImportSummary> {
        let mut store = Store::open(&self.config.database)?;
        self.run_into(&mut store)
    }

    /// Imports every conversation into an already open store.
    pub fn run_into(&self, store: &mut Store) -> Result<ImportSummary> {
        let directories = discover_conversations(&self.config.input_root)?;

        let first_id = if self.config.clear_before_import {
            store.clear_all()?;
            0
        } else {
            store.next_conversation_id()?
        };

        self.emit(ImportEvent::RunStarted {
            conversations: directories.len(),
        });

        let mut summary = ImportSummary::default();
        for (index, directory) in directories.iter().enumerate() {
            self.emit(ImportEvent::ConversationStarted {
                index,
                total: directories.len(),
                directory: directory.clone(),
            });

            let id = first_id + index as i64;
            let (conversation, unrepaired) = self.load_conversation(id, directory)?;

            self.emit(ImportEvent::Saving {
                directory: directory.clone(),
            });
            let persisted = store.persist(&conversation)?;
            self.emit(ImportEvent::ConversationSaved {
                directory: directory.clone(),
                stats: persisted.stats,
            });

            summary.record(&conversation, persisted.stats);
            summary.unrepaired += unrepaired;
        }

        self.emit(ImportEvent::RunFinished {
            conversations: summary.conversations,
        });
        Ok(summary)
    }

    /// Loads and merges every chunk of one conversation directory.
    ///
    /// Returns the conversation and the number of strings left unrepaired.
    pub fn load_conversation(&self, id: i64, directory: &Path) -> Result<(Conversation, usize)> {
        let chunks = discover_chunks(directory, &self.config.chunk_marker)?;
        if chunks.is_empty() {
            return Err(ChatdbError::empty_conversation(directory));
        }

        let mut conversation = Conversation::new(id, directory);
        let mut unrepaired = 0;

        for (index, path) in chunks.iter().enumerate() {
            let chunk = load_chunk(path, self.config.encoding_policy)?;

            for sample in &chunk.report.unrepairable {
                self.emit(ImportEvent::EncodingWarning {
                    path: chunk.path.clone(),
                    sample: sample.clone(),
                });
            }
            unrepaired += chunk.report.unrepairable.len();

            conversation.merge(chunk.document)?;

            self.emit(ImportEvent::ChunkLoaded {
                index,
                total: chunks.len(),
                path: path.clone(),
            });
        }

        Ok((conversation, unrepaired))
    }

    fn emit(&self, event: ImportEvent) {
        (self.progress)(&event);
    }
}
