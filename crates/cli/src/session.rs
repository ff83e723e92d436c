//! Session drivers: the interactive loop and the single-pass task.

use colored::Colorize;
use tagclaw_agent::AgentLoop;
use tagclaw_core::message::{Conversation, Message};
use tagclaw_tools::ask_user::Prompter;
use tracing::{debug, info};

use crate::console::{print_assistant, print_error};
use crate::interrupt::Interrupt;

const EXIT_WORDS: [&str; 2] = ["quit", "exit"];

async fn read_line(prompter: &Prompter, prompt: String) -> Option<String> {
    let prompter = prompter.clone();
    match tokio::task::spawn_blocking(move || prompter(&prompt)).await {
        Ok(Ok(line)) => line,
        Ok(Err(e)) => {
            print_error(&format!("Failed to read input: {e}"));
            None
        }
        Err(_) => None,
    }
}

/// Read requests until the user quits, input closes or Ctrl-C arrives.
/// Provider failures are reported and the conversation is kept, so the next
/// line continues it.
pub async fn run_interactive(
    agent: &AgentLoop,
    prompter: Prompter,
    interrupt: &Interrupt,
) -> Conversation {
    let mut conversation = Conversation::new();
    let prompt = format!("\n{}\n", "User:".green().bold());

    loop {
        let line = tokio::select! {
            biased;
            () = interrupt.fired() => None,
            line = read_line(&prompter, prompt.clone()) => line,
        };
        let Some(line) = line else {
            println!("\nExiting...");
            break;
        };
        let input = line.trim();
        if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
            break;
        }
        if input.is_empty() {
            continue;
        }

        conversation.push(Message::user(input));
        let outcome = tokio::select! {
            biased;
            () = interrupt.fired() => None,
            outcome = agent.process(&mut conversation) => Some(outcome),
        };
        match outcome {
            Some(Ok(answer)) => print_assistant(&answer),
            Some(Err(e)) => {
                print_error(&format!("{e}"));
                print_error("API call failed. Cannot continue this turn.");
            }
            None => {
                println!("\nExiting...");
                break;
            }
        }
    }

    debug!(messages = conversation.len(), "Interactive session ended");
    agent.end_session();
    conversation
}

/// Run one task to completion. `Ok(None)` means Ctrl-C stopped it first.
pub async fn run_single_pass(
    agent: &AgentLoop,
    task: &str,
    interrupt: &Interrupt,
) -> Result<Option<String>, tagclaw_core::Error> {
    let mut conversation = Conversation::new();
    conversation.push(Message::user(task));

    let outcome = tokio::select! {
        biased;
        () = interrupt.fired() => Ok(None),
        outcome = agent.process(&mut conversation) => outcome.map(Some),
    };
    agent.end_session();

    match &outcome {
        Ok(Some(answer)) => {
            print_assistant(answer);
            info!(messages = conversation.len(), "Task finished");
            println!("\nTask finished.");
        }
        Ok(None) => println!("\nExiting..."),
        Err(e) => print_error(&format!("{e}")),
    }
    outcome
}
