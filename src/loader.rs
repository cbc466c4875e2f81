//! Reading chunk files from an export tree.
//!
//! An export looks like:
//!
//! ```text
//! messages/
//! ├── alice_1a2b3c/
//! │   ├── message_1.json
//! │   └── message_2.json
//! └── bookclub_4d5e6f/
//!     └── message_1.json
//! ```
//!
//! [`discover_conversations`] lists the conversation directories,
//! [`discover_chunks`] the chunk files inside one of them, and
//! [`load_chunk`] decodes a chunk with its text repaired.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::encoding::{EncodingPolicy, RepairReport, repair_document};
use crate::error::{ChatdbError, InputErrorKind, Result};
use crate::models::RawDocument;

static CHUNK_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\D*$").expect("valid chunk index regex"));

/// A decoded chunk file.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Where the chunk was read from.
    pub path: PathBuf,
    /// The repaired, decoded content.
    pub document: RawDocument,
    /// What the text repair did.
    pub report: RepairReport,
}

/// Reads, repairs and decodes one chunk file.
///
/// # Errors
///
/// - [`ChatdbError::NotFound`] if `path` does not exist
/// - [`ChatdbError::MalformedInput`] if the file is not UTF-8, not JSON, or
///   does not match the chunk schema
/// - [`ChatdbError::Encoding`] if a string cannot be repaired under
///   [`EncodingPolicy::Strict`]
pub fn load_chunk(path: &Path, policy: EncodingPolicy) -> Result<Chunk> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ChatdbError::not_found(path),
        io::ErrorKind::InvalidData => ChatdbError::MalformedInput {
            path: Some(path.to_path_buf()),
            source: InputErrorKind::NotUtf8,
        },
        _ => ChatdbError::Io(e),
    })?;

    let (document, report) = parse_chunk_str(&content, policy).map_err(|e| e.with_path(path))?;

    Ok(Chunk {
        path: path.to_path_buf(),
        document,
        report,
    })
}

/// Repairs and decodes chunk content already in memory.
pub fn parse_chunk_str(content: &str, policy: EncodingPolicy) -> Result<(RawDocument, RepairReport)> {
    let mut tree: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ChatdbError::malformed(e, None))?;

    let report = repair_document(&mut tree, policy)?;

    let document: RawDocument =
        serde_json::from_value(tree).map_err(|e| ChatdbError::malformed(e, None))?;

    Ok((document, report))
}

/// Returns `true` if `name` looks like a chunk file: contains the marker
/// (case-sensitive) and ends in `.json`.
pub fn is_chunk_file(name: &str, marker: &str) -> bool {
    name.ends_with(".json") && name.contains(marker)
}

/// Extracts the chunk number from a file name (`message_12.json` -> 12).
pub fn chunk_index(name: &str) -> Option<u64> {
    CHUNK_INDEX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Lists the chunk files of one conversation directory, in chunk order.
///
/// Files are ordered by their embedded index; files without one come last,
/// ordered by name.
pub fn discover_chunks(directory: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    let entries = read_dir(directory)?;

    let mut chunks: Vec<(Option<u64>, String, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        // Follows symlinks.
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if is_chunk_file(&name, marker) {
            chunks.push((chunk_index(&name), name, path));
        }
    }

    chunks.sort_by(|a, b| {
        (a.0.is_none(), a.0, &a.1).cmp(&(b.0.is_none(), b.0, &b.1))
    });

    Ok(chunks.into_iter().map(|(_, _, path)| path).collect())
}

/// Lists the conversation directories under the export root, sorted by name.
pub fn discover_conversations(root: &Path) -> Result<Vec<PathBuf>> {
    let mut directories = Vec::new();
    for entry in read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            directories.push(path);
        }
    }
    directories.sort();
    Ok(directories)
}

fn read_dir(path: &Path) -> Result<fs::ReadDir> {
    fs::read_dir(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ChatdbError::not_found(path),
        _ => ChatdbError::Io(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CHUNK: &str = r#"{
        "participants": [{"name": "Alice"}, {"name": "Bob"}],
        "messages": [
            {"sender_name": "Alice", "timestamp_ms": 1705315800000, "type": "Generic",
             "content": "cafÃ©"}
        ],
        "title": "Alice",
        "is_still_participant": true,
        "thread_type": "Regular",
        "thread_path": "inbox/alice_1"
    }"#;

    #[test]
    fn test_parse_chunk_repairs_text() {
        let (doc, report) = parse_chunk_str(CHUNK, EncodingPolicy::Strict).unwrap();
        assert_eq!(doc.messages[0].content.as_deref(), Some("café"));
        assert_eq!(doc.participants.len(), 2);
        assert_eq!(report.repaired, 1);
    }

    #[test]
    fn test_parse_chunk_invalid_json() {
        let err = parse_chunk_str("{not json", EncodingPolicy::Strict).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_parse_chunk_schema_mismatch() {
        let err = parse_chunk_str(r#"{"messages": []}"#, EncodingPolicy::Strict).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_load_chunk_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_chunk(&dir.path().join("message_1.json"), EncodingPolicy::Strict)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_chunk_attaches_path_to_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("message_1.json");
        fs::write(&path, "[1, 2").unwrap();
        let err = load_chunk(&path, EncodingPolicy::Strict).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("message_1.json"));
    }

    #[test]
    fn test_load_chunk_not_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("message_1.json");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = load_chunk(&path, EncodingPolicy::Strict).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_load_chunk_ok() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("message_1.json");
        fs::write(&path, CHUNK).unwrap();
        let chunk = load_chunk(&path, EncodingPolicy::Strict).unwrap();
        assert_eq!(chunk.path, path);
        assert_eq!(chunk.document.title, "Alice");
    }

    #[test]
    fn test_is_chunk_file() {
        assert!(is_chunk_file("message_1.json", "message"));
        assert!(!is_chunk_file("Message_1.json", "message"));
        assert!(!is_chunk_file("message_1.json.bak", "message"));
        assert!(!is_chunk_file("photo.json", "message"));
    }

    #[test]
    fn test_chunk_index() {
        assert_eq!(chunk_index("message_1.json"), Some(1));
        assert_eq!(chunk_index("message_12.json"), Some(12));
        assert_eq!(chunk_index("message.json"), None);
    }

    #[test]
    fn test_discover_chunks_numeric_order() {
        let dir = tempdir().unwrap();
        for name in ["message_10.json", "message_2.json", "message_1.json", "message.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(dir.path().join("message_3.json")).unwrap();

        let chunks = discover_chunks(dir.path(), "message").unwrap();
        let names: Vec<_> = chunks
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["message_1.json", "message_2.json", "message_10.json", "message.json"]
        );
    }

    #[test]
    fn test_discover_conversations_sorted_dirs_only() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("zed_2")).unwrap();
        fs::create_dir(dir.path().join("amy_1")).unwrap();
        fs::write(dir.path().join("readme.txt"), "").unwrap();

        let dirs = discover_conversations(dir.path()).unwrap();
        assert_eq!(dirs, vec![dir.path().join("amy_1"), dir.path().join("zed_2")]);
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = tempdir().unwrap();
        let err = discover_conversations(&dir.path().join("missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let outside = tempdir().unwrap();
        let real_convo = outside.path().join("real_1");
        fs::create_dir(&real_convo).unwrap();
        fs::write(outside.path().join("message_2.json"), CHUNK).unwrap();
        fs::write(real_convo.join("message_1.json"), CHUNK).unwrap();
        symlink(
            outside.path().join("message_2.json"),
            real_convo.join("message_2.json"),
        )
        .unwrap();

        let root = tempdir().unwrap();
        symlink(&real_convo, root.path().join("linked_1")).unwrap();

        let dirs = discover_conversations(root.path()).unwrap();
        assert_eq!(dirs, vec![root.path().join("linked_1")]);

        let chunks = discover_chunks(&dirs[0], "message").unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].ends_with("message_2.json"));
    }
}
