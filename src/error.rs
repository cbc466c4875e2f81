//! Unified error types for chatdb.
//!
//! Every failure in an import run is fatal: a half-written conversation
//! would leave dangling foreign keys, so nothing here is retried or skipped.
//! The variants follow the stages of a run:
//!
//! - [`ChatdbError::NotFound`] - an input path does not exist
//! - [`ChatdbError::MalformedInput`] - a chunk file is not valid JSON or does
//!   not match the export schema
//! - [`ChatdbError::Encoding`] - a string could not be repaired
//! - [`ChatdbError::Integrity`] - chunks of one conversation disagree
//! - [`ChatdbError::EmptyConversation`] - a directory has no chunk files
//! - [`ChatdbError::Persistence`] - the SQLite store rejected a write

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chatdb operations.
pub type Result<T> = std::result::Result<T, ChatdbError>;

/// The error type for all chatdb operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatdbError {
    /// An input file or directory does not exist.
    #[error("Input not found: {}", path.display())]
    NotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Any other I/O failure (permissions, unreadable directory, ...).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A chunk file could not be decoded.
    #[error("Malformed chunk file{}: {source}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    MalformedInput {
        /// The file being decoded, if known
        path: Option<PathBuf>,
        /// What went wrong
        #[source]
        source: InputErrorKind,
    },

    /// A string could not be turned back into UTF-8.
    #[error("Cannot repair text {sample:?} ({reason}){}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Encoding {
        /// The offending string, truncated for display
        sample: String,
        /// Why the round-trip failed
        reason: &'static str,
        /// The chunk file containing the string, if known
        path: Option<PathBuf>,
    },

    /// Two chunks of the same conversation describe different threads.
    #[error("Conversation {} is inconsistent: {field} was {expected:?}, chunk has {found:?}", directory.display())]
    Integrity {
        /// The conversation directory
        directory: PathBuf,
        /// The metadata field that differs
        field: &'static str,
        /// Value adopted from the first chunk
        expected: String,
        /// Value found in the later chunk
        found: String,
    },

    /// A conversation directory holds no chunk files.
    #[error("Conversation {} has no chunk files", directory.display())]
    EmptyConversation {
        /// The conversation directory
        directory: PathBuf,
    },

    /// The database rejected a statement.
    #[error("Database error while {context}: {source}")]
    Persistence {
        /// What the store was doing
        context: String,
        /// The underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },
}

/// Kinds of chunk decoding failures.
#[derive(Debug, Error)]
pub enum InputErrorKind {
    /// Invalid JSON syntax, or JSON that does not fit the export schema
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// The file is not UTF-8 text
    #[error("file is not valid UTF-8")]
    NotUtf8,
}

impl From<rusqlite::Error> for ChatdbError {
    fn from(err: rusqlite::Error) -> Self {
        ChatdbError::Persistence {
            context: "executing a statement".to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatdbError {
    /// Creates a not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ChatdbError::NotFound { path: path.into() }
    }

    /// Creates a malformed-input error from a JSON failure.
    pub fn malformed(source: serde_json::Error, path: Option<PathBuf>) -> Self {
        ChatdbError::MalformedInput {
            path,
            source: InputErrorKind::Json(source),
        }
    }

    /// Creates an encoding error, truncating the sample to a readable length.
    pub fn encoding(sample: &str, reason: &'static str) -> Self {
        const MAX_SAMPLE_CHARS: usize = 40;

        let sample = if sample.chars().count() > MAX_SAMPLE_CHARS {
            let mut s: String = sample.chars().take(MAX_SAMPLE_CHARS).collect();
            s.push('…');
            s
        } else {
            sample.to_string()
        };
        ChatdbError::Encoding {
            sample,
            reason,
            path: None,
        }
    }

    /// Creates an integrity error for a metadata mismatch.
    pub fn integrity(
        directory: impl Into<PathBuf>,
        field: &'static str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        ChatdbError::Integrity {
            directory: directory.into(),
            field,
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates an error for a conversation without chunk files.
    pub fn empty_conversation(directory: impl Into<PathBuf>) -> Self {
        ChatdbError::EmptyConversation {
            directory: directory.into(),
        }
    }

    /// Creates a persistence error with context.
    pub fn persistence(context: impl Into<String>, source: rusqlite::Error) -> Self {
        ChatdbError::Persistence {
            context: context.into(),
            source,
        }
    }

    /// Attaches a file path to errors that carry one and do not have it yet.
    #[must_use]
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            ChatdbError::MalformedInput { path: None, source } => ChatdbError::MalformedInput {
                path: Some(file.into()),
                source,
            },
            ChatdbError::Encoding {
                sample,
                reason,
                path: None,
            } => ChatdbError::Encoding {
                sample,
                reason,
                path: Some(file.into()),
            },
            other => other,
        }
    }

    /// Returns `true` if an input path was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatdbError::NotFound { .. })
    }

    /// Returns `true` if a chunk file could not be decoded.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ChatdbError::MalformedInput { .. })
    }

    /// Returns `true` if a string could not be repaired.
    pub fn is_encoding(&self) -> bool {
        matches!(self, ChatdbError::Encoding { .. })
    }

    /// Returns `true` if chunks of one conversation disagreed.
    pub fn is_integrity(&self) -> bool {
        matches!(self, ChatdbError::Integrity { .. })
    }

    /// Returns `true` if the database rejected a write.
    pub fn is_persistence(&self) -> bool {
        matches!(self, ChatdbError::Persistence { .. })
    }
}
