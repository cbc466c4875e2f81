//! # chatdb CLI
//!
//! Command-line interface for the chatdb library.

use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;

use chatdb::ChatdbError;
use chatdb::cli::Args;
use chatdb::config::ImportConfig;
use chatdb::import::Importer;
use chatdb::progress::stdout_progress;

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), ChatdbError> {
    let total_start = Instant::now();
    let args = <Args as ClapParser>::parse();
    let config = ImportConfig::from(&args);

    // Print header
    println!("🗃️  chatdb v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📂 Input:     {}", config.input_root.display());
    println!("💾 Database:  {}", config.database.display());
    if args.lenient_encoding {
        println!("🔤 Encoding:  lenient");
    }
    if config.clear_before_import {
        println!("🧹 Wiping existing data");
    } else {
        println!("➕ Appending to existing data");
    }
    println!();

    let summary = Importer::new(config.clone())
        .with_progress(stdout_progress())
        .run()?;

    let total_time = total_start.elapsed();

    println!();
    println!(
        "✅ Done! You may access the database now: {}",
        config.database.display()
    );

    // Summary
    println!();
    println!("📊 Summary:");
    println!("   Conversations: {}", summary.conversations);
    println!("   Files:         {}", summary.chunks);
    println!("   Participants:  {}", summary.stats.participants);
    println!("   Messages:      {}", summary.stats.messages);
    println!("   Reactions:     {}", summary.stats.reactions);
    println!("   Attachments:   {}", summary.stats.attachments);
    println!("   Shares:        {}", summary.stats.shares);
    println!("   Stickers:      {}", summary.stats.stickers);
    if let (Some(first), Some(last)) = (summary.first_message, summary.last_message) {
        println!(
            "   Span:          {} → {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    if summary.unrepaired > 0 {
        println!("   Unrepaired:    {} strings", summary.unrepaired);
    }

    println!();
    println!("⚡ Total time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}
