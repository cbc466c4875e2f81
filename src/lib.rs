//! # chatdb
//!
//! Materializes a Messenger/Instagram chat export into a normalized SQLite
//! database.
//!
//! ## Overview
//!
//! Meta's "Download Your Data" export has one directory per conversation,
//! each holding one or more chunk files (`message_1.json`, `message_2.json`,
//! ...). Every string in those files is mis-encoded: UTF-8 bytes stored as
//! Latin-1 characters. chatdb:
//!
//! 1. repairs the text of every chunk ([`encoding`])
//! 2. folds the chunks of a directory into one conversation, checking that
//!    they agree on the thread metadata ([`conversation`])
//! 3. writes conversations, participants, messages, reactions, attachments,
//!    shares and stickers into relational tables ([`store`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatdb::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let config = ImportConfig::new()
//!         .with_input_root("messages/inbox")
//!         .with_database("chats.db");
//!
//!     let summary = Importer::new(config).run()?;
//!     println!("{} conversations imported", summary.conversations);
//!     Ok(())
//! }
//! ```
//!
//! ## Working with single conversations
//!
//! ```rust
//! use chatdb::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let json = r#"{
//!     "title": "Book club", "thread_type": "RegularGroup", "thread_path": "inbox/bookclub_1",
//!     "participants": [{"name": "Alice"}],
//!     "messages": [{"sender_name": "Alice", "timestamp_ms": 1705315800000,
//!                   "type": "Generic", "content": "\u00c3\u00a9"}]
//! }"#;
//! let (document, _report) = parse_chunk_str(json, EncodingPolicy::Strict)?;
//! assert_eq!(document.messages[0].content.as_deref(), Some("é"));
//!
//! let mut conversation = Conversation::new(0, "inbox/bookclub_1");
//! conversation.merge(document)?;
//!
//! let mut store = Store::in_memory()?;
//! let persisted = store.persist(&conversation)?;
//! assert_eq!(persisted.stats.messages, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`encoding`] — mojibake repair ([`repair_text`](encoding::repair_text), [`repair_document`](encoding::repair_document))
//! - [`loader`] — chunk discovery and decoding
//! - [`models`] — typed chunk schema ([`RawDocument`](models::RawDocument), [`MessageRecord`](models::MessageRecord))
//! - [`conversation`] — [`Conversation`](conversation::Conversation) aggregation
//! - [`store`] — SQLite [`Store`](store::Store)
//! - [`import`] — [`Importer`](import::Importer) run orchestration
//! - [`progress`] — progress events and callbacks
//! - [`config`] — [`ImportConfig`](config::ImportConfig)
//! - [`error`] — [`ChatdbError`], [`Result`]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod conversation;
pub mod encoding;
pub mod error;
pub mod import;
pub mod loader;
pub mod models;
pub mod progress;
pub mod store;

// Re-export the main types at the crate root for convenience
pub use error::{ChatdbError, Result};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatdb::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ChatdbError, Result};

    pub use crate::config::ImportConfig;
    pub use crate::conversation::{Conversation, Participant};
    pub use crate::encoding::{EncodingPolicy, RepairReport, repair_document, repair_text};
    pub use crate::import::{ImportSummary, Importer};
    pub use crate::loader::{discover_chunks, discover_conversations, load_chunk, parse_chunk_str};
    pub use crate::models::{AttachmentKind, MessageRecord, RawDocument};
    pub use crate::progress::{ImportEvent, ProgressCallback, no_progress, stdout_progress};
    pub use crate::store::{PersistStats, Store};
}
