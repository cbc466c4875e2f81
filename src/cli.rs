//! Command-line interface definition using clap.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_CHUNK_MARKER, DEFAULT_DATABASE, DEFAULT_INPUT_ROOT, ImportConfig};
use crate::encoding::EncodingPolicy;

/// Load a Messenger/Instagram "messages" export into a SQLite database.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatdb")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatdb
    chatdb facebook-export/messages/inbox -d chats.db
    chatdb instagram-export/messages/inbox --lenient-encoding
    chatdb archived_threads --append")]
pub struct Args {
    /// Directory with one subdirectory per conversation
    #[arg(default_value = DEFAULT_INPUT_ROOT)]
    pub input: PathBuf,

    /// SQLite database to write
    #[arg(short, long, default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Substring chunk file names must contain
    #[arg(long, value_name = "TEXT", default_value = DEFAULT_CHUNK_MARKER)]
    pub marker: String,

    /// Keep text that cannot be repaired instead of aborting
    #[arg(long)]
    pub lenient_encoding: bool,

    /// Do not wipe the database before importing
    #[arg(long)]
    pub append: bool,
}

impl From<&Args> for ImportConfig {
    fn from(args: &Args) -> Self {
        let policy = if args.lenient_encoding {
            EncodingPolicy::Lenient
        } else {
            EncodingPolicy::Strict
        };
        ImportConfig::new()
            .with_input_root(&args.input)
            .with_database(&args.database)
            .with_chunk_marker(args.marker.clone())
            .with_encoding_policy(policy)
            .with_clear_before_import(!args.append)
    }
}
