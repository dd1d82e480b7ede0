//! Interactive chat with the Knowledge Hub.
//!
//! The session token is kept between runs unless `--ephemeral` is given,
//! so a conversation can continue where the previous one stopped.

use kbhub_config::Config;
use kbhub_conversation::{ConversationController, ResetHandle, Submission, SubmitError};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::render;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Optional persona override
    pub persona: Option<String>,
    /// Keep the session token in memory only
    pub ephemeral: bool,
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Empty,
    Exit,
    Help,
    Clear,
    Persona(Option<String>),
    Suggestion(usize),
    Question(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();

        if line.is_empty() {
            return Self::Empty;
        }
        if matches!(line, "exit" | "quit" | "q") {
            return Self::Exit;
        }

        let Some(command) = line.strip_prefix('/') else {
            return Self::Question(line.to_string());
        };

        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));

        match name {
            "help" => Self::Help,
            "clear" => Self::Clear,
            "persona" if arg.is_empty() => Self::Persona(None),
            "persona" => Self::Persona(Some(arg.to_string())),
            _ => name
                .parse::<usize>()
                .map_or_else(|_| Self::Question(line.to_string()), Self::Suggestion),
        }
    }
}

/// Strategy for executing the Chat command.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let controller = super::build_controller(&config, input.persona, input.ephemeral)?;
        let suggestions = config.chat.suggestions;

        println!(
            "=== Knowledge Hub chat (persona: {}) ===",
            controller.persona()
        );
        println!("Type /help for commands, 'exit' to quit.\n");
        render::print_suggestions(&suggestions);

        let mut resets: Vec<ResetHandle> = Vec::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match ReplCommand::parse(&line) {
                ReplCommand::Empty => {}
                ReplCommand::Exit => break,
                ReplCommand::Help => render::print_help(),
                ReplCommand::Clear => {
                    resets.push(controller.reset());
                    println!("Chat cleared.\n");
                    render::print_suggestions(&suggestions);
                }
                ReplCommand::Persona(None) => println!("Persona: {}", controller.persona()),
                ReplCommand::Persona(Some(persona)) => {
                    controller.change_persona(persona);
                    println!("Persona: {}", controller.persona());
                }
                ReplCommand::Suggestion(n) => {
                    let suggestion = n
                        .checked_sub(1)
                        .and_then(|i| suggestions.get(i))
                        .cloned();
                    match suggestion {
                        Some(question) => {
                            println!("> {question}");
                            converse(&controller, controller.select_suggestion(question)).await;
                        }
                        None => println!("No suggestion #{n}"),
                    }
                }
                ReplCommand::Question(question) => {
                    controller.set_pending_input(question.clone());
                    converse(&controller, controller.submit(question)).await;
                }
            }
        }

        // Let any session teardown finish before the runtime shuts down.
        for reset in resets {
            reset.finished().await;
        }

        info!(
            "Chat ended with {} entries",
            controller.transcript().len()
        );
        Ok(())
    }
}

/// Wait for one submission and print its settled entry.
async fn converse(
    controller: &ConversationController,
    submission: Result<Submission, SubmitError>,
) {
    let submission = match submission {
        Ok(submission) => submission,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    let id = submission.id();
    submission.settled().await;

    if let Some(entry) = controller.transcript().get(id) {
        render::print_entry(entry);
    }
}
