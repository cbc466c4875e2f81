//! Progress reporting for import runs.
//!
//! The importer pushes an [`ImportEvent`] to a [`ProgressCallback`] at each
//! step. Library users can hook their own reporting in; the CLI uses
//! [`stdout_progress`].
//!
//! # Example
//!
//! ```rust
//! use chatdb::progress::{ImportEvent, ProgressCallback};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|event| {
//!     if let ImportEvent::ConversationStarted { index, total, .. } = event {
//!         println!("{}/{}", index + 1, total);
//!     }
//! });
//!
//! callback(&ImportEvent::RunStarted { conversations: 3 });
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::store::PersistStats;

/// A step of an import run.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    /// Conversation directories have been discovered.
    RunStarted {
        /// Number of conversation directories found.
        conversations: usize,
    },

    /// A conversation directory is about to be loaded.
    ConversationStarted {
        /// Zero-based position, also the conversation id.
        index: usize,
        total: usize,
        directory: PathBuf,
    },

    /// A chunk file was loaded and merged.
    ChunkLoaded {
        /// Zero-based position within the conversation.
        index: usize,
        total: usize,
        path: PathBuf,
    },

    /// A string was kept unrepaired (lenient encoding only).
    EncodingWarning { path: PathBuf, sample: String },

    /// A conversation is about to be written.
    Saving { directory: PathBuf },

    /// A conversation was committed.
    ConversationSaved {
        directory: PathBuf,
        stats: PersistStats,
    },

    /// Every conversation was committed.
    RunFinished { conversations: usize },
}

/// Callback type for receiving import events.
pub type ProgressCallback = Arc<dyn Fn(&ImportEvent) + Send + Sync>;

/// Creates a no-op progress callback.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a callback that prints one line per step to stdout, and
/// encoding warnings to stderr.
pub fn stdout_progress() -> ProgressCallback {
    Arc::new(|event| match event {
        ImportEvent::RunStarted { conversations } => {
            println!("🔎 Found {} conversations", conversations);
        }
        ImportEvent::ConversationStarted {
            index,
            total,
            directory,
        } => {
            println!();
            println!(
                "💬 Conversation #{} out of {}: {}",
                index + 1,
                total,
                directory.display()
            );
        }
        ImportEvent::ChunkLoaded { index, total, .. } => {
            println!("   Loading files: {}/{}", index + 1, total);
        }
        ImportEvent::EncodingWarning { path, sample } => {
            eprintln!("⚠️  Kept unrepaired text {:?} in {}", sample, path.display());
        }
        ImportEvent::Saving { .. } => {
            println!("   Saving to database...");
        }
        ImportEvent::ConversationSaved { stats, .. } => {
            println!(
                "   Saved {} messages, {} participants",
                stats.messages, stats.participants
            );
        }
        ImportEvent::RunFinished { .. } => {}
    })
}
