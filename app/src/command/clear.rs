use kbhub_config::Config;

/// Strategy for ending the stored Knowledge Hub session.
///
/// The server is asked to forget the session; the local token is removed
/// even if that request fails.
#[derive(Debug, Clone, Copy)]
pub struct ClearStrategy;

impl super::CommandStrategy for ClearStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let controller = super::build_controller(&config, None, false)?;

        controller.reset().finished().await;

        println!("Session cleared.");
        Ok(())
    }
}
