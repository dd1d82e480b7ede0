use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kbhub_core::{SessionStore, SessionToken};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    session_id: SessionToken,
    updated_at: DateTime<Utc>,
}

/// Session store backed by one JSON file.
///
/// The file holds exactly one token. A missing file means no session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/kbhub/session.json`
    pub fn default_location() -> anyhow::Result<Self> {
        let path = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("kbhub")
            .join("session.json");

        Ok(Self::new(path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self) -> anyhow::Result<Option<SessionToken>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredSession = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file: {}", self.path.display()))?;

        debug!("Loaded session token stored at {}", stored.updated_at);
        Ok(Some(stored.session_id))
    }

    async fn set(&self, token: &SessionToken) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let stored = StoredSession {
            session_id: token.clone(),
            updated_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&stored)?;

        // Write then rename; readers never see a partial file.
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        debug!("Stored session token at {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Cleared session token at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
