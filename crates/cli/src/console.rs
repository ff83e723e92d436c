//! Terminal presentation: the approval prompt, tool call traces and
//! assistant output.

use colored::Colorize;
use std::sync::Arc;
use tagclaw_agent::{os_info, LoopState, TurnObserver};
use tagclaw_core::approval::{parse_answer, ApprovalGate, ApprovalRequest, Decision};
use tagclaw_core::message::MessageToolCall;
use tagclaw_core::tool::ToolResult;
use tagclaw_tools::ask_user::{stdin_prompt, Prompter};

use crate::interrupt::Interrupt;

const RULE: &str = "-------------------------------------";

const BASE_WARNING: &str = "Executing commands, writing/copying files, creating directories, \
or accessing the web can be dangerous.";

/// Prompter that writes the prompt to stdout and reads one line from stdin.
pub fn stdin_prompter() -> Prompter {
    Arc::new(stdin_prompt)
}

pub fn print_warning(message: &str) {
    eprintln!("{}", format!("Warning: {message}").yellow());
}

fn print_severe_warning(message: &str) {
    eprintln!("{}", format!("Warning: {message}").red());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red().bold());
}

/// Print the model's answer, dimming `<think>` sections.
pub fn print_assistant(content: &str) {
    println!("\n{}", "Assistant:".blue().bold());
    let mut rest = content;
    while let Some(start) = rest.find("<think>") {
        print!("{}", &rest[..start]);
        let after = &rest[start..];
        let end = after.find("</think>").map_or(after.len(), |i| i + "</think>".len());
        print!("{}", after[..end].dimmed());
        rest = &after[end..];
    }
    println!("{rest}");
}

/// Body of the approval prompt, without colors.
pub fn render_request(request: &ApprovalRequest) -> String {
    let mut out = String::new();
    out.push_str(&format!("  Action: {}\n", request.action));
    if request.tool_name == "execute_python_code" {
        out.push_str(&format!("  Code:\n-------\n{}\n-------\n", request.detail));
    } else {
        out.push_str(&format!("  Details: {}\n", request.detail));
    }
    out.push_str(&format!("OS: {}", os_info()));
    out
}

/// Asks the human at the terminal. Re-prompts on anything that is not a
/// yes/no answer; closed input, a read error or Ctrl-C counts as no.
pub struct ConsoleApproval {
    prompter: Prompter,
    interrupt: Interrupt,
}

impl ConsoleApproval {
    pub fn new(interrupt: Interrupt) -> Self {
        Self::with_prompter(stdin_prompter(), interrupt)
    }

    pub fn with_prompter(prompter: Prompter, interrupt: Interrupt) -> Self {
        Self { prompter, interrupt }
    }

    fn show(request: &ApprovalRequest) {
        eprintln!("\n{RULE}");
        print_warning("The assistant wants to perform the following action:");
        eprintln!("{}", render_request(request));
        match request.tool_name.as_str() {
            "execute_python_code" => print_severe_warning(
                "Executing Python code is EXTREMELY DANGEROUS and runs with the agent's permissions.",
            ),
            "execute_shell_command" => print_severe_warning(&format!(
                "{BASE_WARNING}\nExecuting SHELL commands can have unintended consequences. Review carefully."
            )),
            _ => print_warning(BASE_WARNING),
        }
        eprintln!("{RULE}");
    }
}

/// Keep asking until the answer parses. `None` input means the stream closed.
fn ask_until_answered(prompter: &Prompter) -> Decision {
    let question = format!("Allow this action? ({}/{}): ", "y".green().bold(), "N".red());
    loop {
        match prompter(&question) {
            Ok(Some(answer)) => match parse_answer(&answer) {
                Some(decision) => return decision,
                None => eprintln!("Invalid input. Please enter 'y' or 'n'."),
            },
            Ok(None) => {
                print_error("Input closed. Assuming 'No'.");
                return Decision::Denied;
            }
            Err(e) => {
                print_error(&format!("Could not read answer ({e}). Assuming 'No'."));
                return Decision::Denied;
            }
        }
    }
}

#[async_trait::async_trait]
impl ApprovalGate for ConsoleApproval {
    async fn confirm(&self, request: &ApprovalRequest) -> Decision {
        Self::show(request);
        let prompter = self.prompter.clone();
        let answer = tokio::task::spawn_blocking(move || ask_until_answered(&prompter));
        let decision = tokio::select! {
            biased;
            () = self.interrupt.fired() => {
                print_error("Interrupted. Assuming 'No'.");
                Decision::Denied
            }
            joined = answer => joined.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Approval prompt panicked");
                Decision::Denied
            }),
        };
        if !decision.is_approved() {
            eprintln!("{}", "Action skipped by user.".bright_black());
        }
        decision
    }
}

/// Prints tool activity as the loop reports it.
pub struct ConsoleObserver;

fn pretty(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| raw.to_string())
}

impl TurnObserver for ConsoleObserver {
    fn on_state(&self, state: LoopState) {
        if state == LoopState::AwaitingModel {
            eprintln!("\n{}", "Waiting for assistant...".bright_black());
        }
    }

    fn on_tool_call(&self, call: &MessageToolCall) {
        println!("\n{}", "Tool Call Request:".magenta().bold());
        println!("  Function: {}", call.name);
        println!("  Arguments:\n{}", pretty(&call.arguments));
    }

    fn on_tool_result(&self, call: &MessageToolCall, result: &ToolResult) {
        let short_id: String = call.id.chars().take(8).collect();
        println!(
            "\n{}",
            format!("Tool Result ({} [{short_id}...]):", call.name).bright_black()
        );
        match serde_json::to_string_pretty(&result.payload) {
            Ok(text) => println!("{text}"),
            Err(_) => println!("{}", result.to_content()),
        }
    }
}
