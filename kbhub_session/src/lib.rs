#![deny(
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

//! Session token storage.
//!
//! The Knowledge Hub session is a single opaque token. `FileSessionStore`
//! keeps it across process restarts; `MemorySessionStore` keeps it for the
//! lifetime of the process only.

mod file;
mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
