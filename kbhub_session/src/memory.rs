use async_trait::async_trait;
use kbhub_core::{SessionStore, SessionToken};
use std::sync::{Mutex, PoisonError};

/// In-process session store. Forgets the token when dropped.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<SessionToken>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token already stored.
    #[must_use]
    pub fn with_token(token: SessionToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }

    /// Synchronous peek, handy for assertions and status output.
    #[must_use]
    pub fn current(&self) -> Option<SessionToken> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, token: Option<SessionToken>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> anyhow::Result<Option<SessionToken>> {
        Ok(self.current())
    }

    async fn set(&self, token: &SessionToken) -> anyhow::Result<()> {
        self.replace(Some(token.clone()));
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.replace(None);
        Ok(())
    }
}
