//! Configuration for import runs.
//!
//! [`ImportConfig`] is a plain struct with builder methods and no CLI
//! framework dependencies, so it can be built by library users or
//! deserialized from a file.
//!
//! # Example
//!
//! ```rust
//! use chatdb::config::ImportConfig;
//! use chatdb::encoding::EncodingPolicy;
//!
//! let config = ImportConfig::new()
//!     .with_input_root("export/messages/inbox")
//!     .with_database("chats.db")
//!     .with_encoding_policy(EncodingPolicy::Lenient);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoding::EncodingPolicy;

/// Default directory holding one subdirectory per conversation.
pub const DEFAULT_INPUT_ROOT: &str = "messages";

/// Default SQLite database file.
pub const DEFAULT_DATABASE: &str = "database.db";

/// Default substring identifying chunk files.
pub const DEFAULT_CHUNK_MARKER: &str = "message";

/// Settings of one import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Directory with one subdirectory per conversation (default: `messages`)
    pub input_root: PathBuf,

    /// SQLite database to write (default: `database.db`)
    pub database: PathBuf,

    /// Case-sensitive substring chunk file names must contain (default: `message`)
    pub chunk_marker: String,

    /// What to do with unrepairable text (default: strict)
    pub encoding_policy: EncodingPolicy,

    /// Wipe every table before importing (default: true)
    pub clear_before_import: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from(DEFAULT_INPUT_ROOT),
            database: PathBuf::from(DEFAULT_DATABASE),
            chunk_marker: DEFAULT_CHUNK_MARKER.to_string(),
            encoding_policy: EncodingPolicy::Strict,
            clear_before_import: true,
        }
    }
}

impl ImportConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the export root directory.
    #[must_use]
    pub fn with_input_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.input_root = root.into();
        self
    }

    /// Sets the database file.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the chunk file marker.
    #[must_use]
    pub fn with_chunk_marker(mut self, marker: impl Into<String>) -> Self {
        self.chunk_marker = marker.into();
        self
    }

    /// Sets the encoding policy.
    #[must_use]
    pub fn with_encoding_policy(mut self, policy: EncodingPolicy) -> Self {
        self.encoding_policy = policy;
        self
    }

    /// Sets whether to wipe the database before importing.
    #[must_use]
    pub fn with_clear_before_import(mut self, clear: bool) -> Self {
        self.clear_before_import = clear;
        self
    }
}
