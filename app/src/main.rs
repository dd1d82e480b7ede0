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

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;
mod render;

use command::{
    AskInput, AskStrategy, ChatInput, ChatStrategy, ClearStrategy, CommandStrategy, InfoStrategy,
    InitStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "kbhub")]
#[command(about = "Knowledge Hub chat client", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the Knowledge Hub interactively
    Chat {
        /// Persona to start with
        #[arg(short, long)]
        persona: Option<String>,

        /// Keep the session in memory only
        #[arg(long)]
        ephemeral: bool,
    },
    /// Ask a single question
    Ask {
        /// Question to send
        #[arg(short = 'm', long)]
        message: String,

        /// Persona to ask with
        #[arg(short, long)]
        persona: Option<String>,
    },
    /// End the current session
    Clear,
    /// Initialize configuration
    Init,
    /// Show configuration and session status
    Info,
    /// Show version
    Version,
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Chat { persona, ephemeral } => {
            ChatStrategy
                .execute(ChatInput { persona, ephemeral })
                .await
        }
        Commands::Ask { message, persona } => {
            AskStrategy.execute(AskInput { message, persona }).await
        }
        Commands::Clear => ClearStrategy.execute(()).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
