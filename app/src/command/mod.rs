//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use kbhub_config::Config;
use kbhub_conversation::{ConversationConfig, ConversationController};
use kbhub_core::{AnsweringService, Persona, SessionStore};
use kbhub_providers::KnowledgeHubClient;
use kbhub_session::{FileSessionStore, MemorySessionStore};
use std::sync::Arc;
use tracing::info;

mod ask;
mod chat;
mod clear;
mod info;
mod init;
mod version;

pub use ask::{AskInput, AskStrategy};
pub use chat::{ChatInput, ChatStrategy};
pub use clear::ClearStrategy;
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Build the HTTP client described by the `service` section.
fn build_client(config: &Config) -> anyhow::Result<KnowledgeHubClient> {
    let mut client = KnowledgeHubClient::new(&config.service.base_url, config.service.timeout())?
        .with_teardown_delays(config.service.teardown_delays());

    if let Some(api_key) = &config.service.api_key {
        client = client.with_api_key(api_key.clone());
    }

    Ok(client)
}

/// Session store: the configured file, or memory only when `ephemeral`.
fn build_store(config: &Config, ephemeral: bool) -> anyhow::Result<Arc<dyn SessionStore>> {
    if ephemeral {
        info!("Using an in-memory session");
        return Ok(Arc::new(MemorySessionStore::new()));
    }

    let path = config.session.resolve_path()?;
    info!("Session token file: {}", path.display());
    Ok(Arc::new(FileSessionStore::new(path)))
}

/// Wire a controller from configuration.
///
/// `persona` overrides `chat.default_persona` when given.
fn build_controller(
    config: &Config,
    persona: Option<String>,
    ephemeral: bool,
) -> anyhow::Result<ConversationController> {
    let service: Arc<dyn AnsweringService> = Arc::new(build_client(config)?);
    let store = build_store(config, ephemeral)?;

    let persona = persona.map_or_else(|| config.chat.persona(), Persona::new);
    let conversation_config = ConversationConfig::default()
        .with_persona(persona)
        .with_policy(config.chat.submission_policy);

    Ok(ConversationController::new(
        service,
        store,
        conversation_config,
    ))
}

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```rust,ignore
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         // Command logic here
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
