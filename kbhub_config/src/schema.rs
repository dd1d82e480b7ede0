use kbhub_core::{DEFAULT_PERSONA, Persona, SubmissionPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_TEMPLATE: &str = r#"{
  "service": {
    "base_url": "http://localhost:8000",
    "timeout_secs": 60,
    "api_key": null,
    "teardown_retry_delays_ms": [500, 1000]
  },
  "chat": {
    "default_persona": "none",
    "submission_policy": "reject",
    "suggestions": [
      "What is the Knowledge Hub?",
      "Which documents does the Knowledge Hub search?",
      "How do I start a new project?"
    ]
  },
  "session": {
    "path": null
  }
}"#;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    #[serde(default = "ServiceConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "ServiceConfig::default_teardown_retry_delays_ms")]
    pub teardown_retry_delays_ms: Vec<u64>,
}

impl ServiceConfig {
    const fn default_timeout_secs() -> u64 {
        60
    }

    fn default_teardown_retry_delays_ms() -> Vec<u64> {
        vec![500, 1000]
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn teardown_delays(&self) -> Vec<Duration> {
        self.teardown_retry_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "ChatConfig::default_persona")]
    pub default_persona: String,
    #[serde(default)]
    pub submission_policy: SubmissionPolicy,
    /// Starter questions offered while the conversation is empty
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_persona: Self::default_persona(),
            submission_policy: SubmissionPolicy::default(),
            suggestions: Vec::new(),
        }
    }
}

impl ChatConfig {
    fn default_persona() -> String {
        DEFAULT_PERSONA.to_string()
    }

    #[must_use]
    pub fn persona(&self) -> Persona {
        Persona::new(self.default_persona.clone())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SessionConfig {
    /// Session token file; `~/kbhub/session.json` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SessionConfig {
    pub fn resolve_path(&self) -> anyhow::Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_dir()?.join("session.json")),
        }
    }
}

impl Config {
    /// `~/kbhub`
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("kbhub"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'kbhub init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;

        if config.service.base_url.trim().is_empty() {
            anyhow::bail!("service.base_url must not be empty ({})", path.display());
        }

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Write the template to `path`, refusing to overwrite.
    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }

        std::fs::write(path, CONFIG_TEMPLATE)?;
        Ok(())
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        Self::write_template(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Point service.base_url at your Knowledge Hub");
        println!("   2. Set service.api_key if the hub requires one");
        println!("   3. Run 'kbhub chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - chat.default_persona: persona sent with every question");
        println!("   - chat.submission_policy: 'reject' or 'queue' questions asked while waiting");
        println!("   - chat.suggestions: starter questions shown in an empty chat");
        println!("   - session.path: where the session token is kept");
        println!();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trips() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.service.timeout(), Duration::from_secs(60));
        assert_eq!(
            config.service.teardown_delays(),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
        assert_eq!(config.chat.persona(), Persona::default());
        assert_eq!(config.chat.submission_policy, SubmissionPolicy::Reject);
        assert_eq!(config.chat.suggestions.len(), 3);
        assert!(config.session.path.is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"service": {"base_url": "https://kb.example"}}"#).unwrap();

        assert_eq!(config.service.timeout_secs, 60);
        assert_eq!(config.service.api_key, None);
        assert_eq!(config.chat.default_persona, "none");
        assert!(config.chat.suggestions.is_empty());
    }

    #[test]
    fn test_session_path_override() {
        let config = SessionConfig {
            path: Some(PathBuf::from("/tmp/kb-session.json")),
        };
        assert_eq!(
            config.resolve_path().unwrap(),
            PathBuf::from("/tmp/kb-session.json")
        );
    }

    #[test]
    fn test_write_template_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::write_template(&path).unwrap();
        assert!(Config::write_template(&path).is_err());

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.service.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_rejects_empty_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"service": {"base_url": "  "}}"#).unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_queue_policy_parses() {
        let config: Config = serde_json::from_str(
            r#"{"service": {"base_url": "x"}, "chat": {"submission_policy": "queue"}}"#,
        )
        .unwrap();
        assert_eq!(config.chat.submission_policy, SubmissionPolicy::Queue);
    }
}
