use kbhub_config::Config;
use kbhub_conversation::Settlement;

use crate::render;

/// Input parameters for the Ask command strategy.
#[derive(Debug, Clone)]
pub struct AskInput {
    /// Question to send
    pub message: String,
    /// Optional persona override
    pub persona: Option<String>,
}

/// Strategy for asking a single question.
///
/// Uses the persisted session, so consecutive invocations continue the same
/// Knowledge Hub conversation until `kbhub clear` is run.
#[derive(Debug, Clone, Copy)]
pub struct AskStrategy;

impl super::CommandStrategy for AskStrategy {
    type Input = AskInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let controller = super::build_controller(&config, input.persona, false)?;

        let submission = controller.submit(input.message)?;
        let id = submission.id();
        let settlement = submission.settled().await;

        if let Some(entry) = controller.transcript().get(id) {
            render::print_entry(entry);
        }

        if settlement == Settlement::Failed {
            let cause = controller
                .view()
                .last_error
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Knowledge Hub request failed: {cause}");
        }

        Ok(())
    }
}
