#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Conversation state for the Knowledge Hub client.
//!
//! # Key Features
//! - Optimistic placeholder entries, settled in place by id
//! - One session token carried across turns and dropped on reset
//! - Explicit policy for submissions made while an answer is pending
//! - Replies that arrive after a reset are discarded

mod controller;
mod lane;
mod transcript;

pub use controller::{
    ConversationConfig, ConversationController, ConversationView, ERROR_ANSWER, ResetHandle,
    Settlement, SubmitError, Submission,
};
pub use transcript::{EntryId, EntryStatus, Transcript, TranscriptEntry};
