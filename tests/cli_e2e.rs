//! End-to-end CLI tests for chatdb.
//!
//! These run the actual binary against a temporary export tree.
//!
//! ```bash
//! cargo test --test cli_e2e
//! ```

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{TempDir, tempdir};

const CHUNK: &str = r#"{
  "participants": [{"name": "Alice"}, {"name": "Bob"}],
  "messages": [
    {"sender_name": "Bob", "timestamp_ms": 1705315860000, "type": "Generic", "content": "Hello!"},
    {"sender_name": "Alice", "timestamp_ms": 1705315800000, "type": "Generic", "content": "Hey!",
     "reactions": [{"reaction": "ð\u009f\u0091\u008d", "actor": "Bob"}]}
  ],
  "title": "Test Chat",
  "thread_type": "Regular",
  "thread_path": "inbox/testchat_1"
}"#;

/// Creates an export with one conversation of two chunks.
fn setup_export() -> TempDir {
    let dir = tempdir().expect("Failed to create temp dir");
    let convo = dir.path().join("messages").join("testchat_1");
    fs::create_dir_all(&convo).unwrap();
    fs::write(convo.join("message_1.json"), CHUNK).unwrap();
    fs::write(convo.join("message_2.json"), CHUNK).unwrap();
    dir
}

fn chatdb() -> Command {
    Command::cargo_bin("chatdb").expect("binary exists")
}

#[test]
fn test_help() {
    chatdb()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--database"))
        .stdout(predicate::str::contains("--lenient-encoding"));
}

#[test]
fn test_version() {
    chatdb()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_default_paths() {
    let dir = setup_export();

    chatdb()
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Conversation #1 out of 1"))
        .stdout(predicate::str::contains("Loading files: 2/2"))
        .stdout(predicate::str::contains("Done!"));

    assert!(dir.path().join("database.db").exists());
}

#[test]
fn test_explicit_paths_and_summary() {
    let dir = setup_export();
    let db = dir.path().join("out.db");

    chatdb()
        .arg(dir.path().join("messages"))
        .arg("-d")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Messages:      4"))
        .stdout(predicate::str::contains("Participants:  2"))
        .stdout(predicate::str::contains("Reactions:     2"));

    let store = chatdb::store::Store::open(&db).unwrap();
    assert_eq!(store.count_rows("messages").unwrap(), 4);
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().unwrap();

    chatdb()
        .current_dir(dir.path())
        .arg("does_not_exist")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("does_not_exist"));
}

#[test]
fn test_integrity_violation_fails() {
    let dir = setup_export();
    let convo = dir.path().join("messages").join("testchat_1");
    fs::write(
        convo.join("message_2.json"),
        CHUNK.replace("Test Chat", "Renamed Chat"),
    )
    .unwrap();

    chatdb()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("inconsistent"))
        .stderr(predicate::str::contains("title"));
}

#[test]
fn test_lenient_encoding_warns() {
    let dir = setup_export();
    let convo = dir.path().join("messages").join("testchat_1");
    fs::write(convo.join("message_2.json"), CHUNK.replace("Hello!", "\\u00ff")).unwrap();

    chatdb()
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot repair text"));

    chatdb()
        .current_dir(dir.path())
        .arg("--lenient-encoding")
        .assert()
        .success()
        .stderr(predicate::str::contains("Kept unrepaired text"))
        .stdout(predicate::str::contains("Unrepaired:    1 strings"));
}

#[test]
fn test_append_flag_adds_second_export() {
    let dir = setup_export();
    let other = dir.path().join("archived").join("otherchat_1");
    fs::create_dir_all(&other).unwrap();
    fs::write(
        other.join("message_1.json"),
        CHUNK
            .replace("Test Chat", "Other Chat")
            .replace("testchat_1", "otherchat_1"),
    )
    .unwrap();

    chatdb().current_dir(dir.path()).assert().success();

    chatdb()
        .current_dir(dir.path())
        .arg("archived")
        .arg("--append")
        .assert()
        .success()
        .stdout(predicate::str::contains("Appending"))
        .stdout(predicate::str::contains("Messages:      2"));

    let store = chatdb::store::Store::open(dir.path().join("database.db")).unwrap();
    assert_eq!(store.count_rows("conversations").unwrap(), 2);
    assert_eq!(store.count_rows("messages").unwrap(), 6);
    assert_eq!(store.next_conversation_id().unwrap(), 2);
}
