//! Terminal rendering of transcript entries.

use kbhub_conversation::{EntryStatus, TranscriptEntry};
use kbhub_core::Source;

pub fn print_entry(entry: &TranscriptEntry) {
    match entry.status {
        EntryStatus::Pending => println!("\n(waiting for the Knowledge Hub...)\n"),
        EntryStatus::Answered | EntryStatus::Failed => {
            println!("\n{}\n", entry.answer);
            print_sources(&entry.sources);
        }
    }
}

fn print_sources(sources: &[Source]) {
    if sources.is_empty() {
        return;
    }

    println!("Sources:");
    for (i, source) in sources.iter().enumerate() {
        println!("  [{}] {}", i + 1, format_source(source));
    }
    println!();
}

fn format_source(source: &Source) -> String {
    match (&source.title, &source.url) {
        (Some(title), Some(url)) => format!("{title} <{url}>"),
        (Some(title), None) => title.clone(),
        (None, Some(url)) => url.clone(),
        (None, None) => "(no reference)".to_string(),
    }
}

/// "Ideas for you" list shown while the conversation is empty.
pub fn print_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }

    println!("Ideas for you:");
    for (i, suggestion) in suggestions.iter().enumerate() {
        println!("  /{} {suggestion}", i + 1);
    }
    println!();
}

pub fn print_help() {
    println!(
        r"
Commands:
  /<n>             Ask suggestion number n
  /persona [name]  Show or change the persona
  /clear           Clear the chat and end the session
  /help            Show this help
  exit, quit, q    Leave

Anything else is sent to the Knowledge Hub as a question.
"
    );
}
