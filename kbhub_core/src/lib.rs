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

use async_trait::async_trait;
use std::sync::Arc;

pub mod types;

pub use types::{
    Answer, AskRequest, DEFAULT_PERSONA, Persona, SessionToken, Source, SubmissionPolicy,
};

/// Remote Knowledge Hub boundary.
///
/// Implementations hold no conversation state: every call is a single
/// request/response exchange. Any failure (transport, status, payload) is
/// reported through the `anyhow::Error` and treated uniformly by callers.
#[async_trait]
pub trait AnsweringService: Send + Sync {
    /// Ask one question within the given persona and (optional) session.
    async fn ask(&self, request: &AskRequest) -> anyhow::Result<Answer>;

    /// Ask the service to forget a session. Best effort.
    async fn end_session(&self, session: Option<&SessionToken>) -> anyhow::Result<()>;
}

/// Durable single-slot storage for the session token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self) -> anyhow::Result<Option<SessionToken>>;

    /// Overwrites any stored token.
    async fn set(&self, token: &SessionToken) -> anyhow::Result<()>;

    /// Removes the token. Clearing an absent token is a no-op.
    async fn clear(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: AnsweringService + ?Sized> AnsweringService for Arc<T> {
    async fn ask(&self, request: &AskRequest) -> anyhow::Result<Answer> {
        (**self).ask(request).await
    }

    async fn end_session(&self, session: Option<&SessionToken>) -> anyhow::Result<()> {
        (**self).end_session(session).await
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self) -> anyhow::Result<Option<SessionToken>> {
        (**self).get().await
    }

    async fn set(&self, token: &SessionToken) -> anyhow::Result<()> {
        (**self).set(token).await
    }

    async fn clear(&self) -> anyhow::Result<()> {
        (**self).clear().await
    }
}
