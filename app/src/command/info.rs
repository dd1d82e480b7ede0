use kbhub_config::Config;
use kbhub_core::SessionStore;
use kbhub_session::FileSessionStore;
use tracing::info;

/// Strategy for displaying configuration information.
///
/// This strategy outputs:
/// - Knowledge Hub endpoint, timeout and API key (masked)
/// - Chat defaults (persona, submission policy, suggestions)
/// - Session token location and whether a session is active
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== kbhub Configuration ===\n");

        println!("Knowledge Hub:");
        println!("  URL: {}", config.service.base_url);
        println!("  Timeout: {}s", config.service.timeout_secs);
        match &config.service.api_key {
            Some(key) => println!("  API Key: {}", mask_secret(key)),
            None => println!("  API Key: (not set)"),
        }
        println!(
            "  Teardown Retries (ms): {:?}",
            config.service.teardown_retry_delays_ms
        );
        println!();

        println!("Chat:");
        println!("  Default Persona: {}", config.chat.default_persona);
        println!(
            "  Submission Policy: {}",
            format_policy(config.chat.submission_policy)
        );
        println!("  Suggestions: {}", config.chat.suggestions.len());
        for suggestion in &config.chat.suggestions {
            println!("    - {}", truncate(suggestion, 60));
        }
        println!();

        println!("Session:");
        let store = FileSessionStore::new(config.session.resolve_path()?);
        println!("  File: {}", store.path().display());

        info!("Reading stored session token");
        match store.get().await {
            Ok(Some(token)) => println!("  Status: active ({})", mask_secret(token.as_str())),
            Ok(None) => println!("  Status: none"),
            Err(e) => {
                println!("  Status: unreadable");
                println!("  Error: {e}");
            }
        }

        Ok(())
    }
}

const fn format_policy(policy: kbhub_core::SubmissionPolicy) -> &'static str {
    match policy {
        kbhub_core::SubmissionPolicy::Reject => "reject while waiting",
        kbhub_core::SubmissionPolicy::Queue => "queue while waiting",
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}
