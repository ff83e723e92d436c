//! Ask-user tool: put a question to the human and return the answer.

use async_trait::async_trait;
use serde_json::json;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Tool, ToolResult};

/// Shows a question and returns one line, or `None` when input is closed.
pub type Prompter = Arc<dyn Fn(&str) -> std::io::Result<Option<String>> + Send + Sync>;

pub struct AskUserTool {
    prompter: Prompter,
}

impl AskUserTool {
    /// Ask on the process's stdin/stdout.
    pub fn new() -> Self {
        Self::with_prompter(Arc::new(|question: &str| stdin_prompt(&question_prompt(question))))
    }

    pub fn with_prompter(prompter: Prompter) -> Self {
        Self { prompter }
    }
}

impl Default for AskUserTool {
    fn default() -> Self {
        Self::new()
    }
}

fn question_prompt(question: &str) -> String {
    format!("{question}\nYour response: ")
}

/// Write `prompt` to stdout and read one line from stdin, without the line
/// ending. `None` means stdin is closed.
pub fn stdin_prompt(prompt: &str) -> std::io::Result<Option<String>> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[async_trait]
impl Tool for AskUserTool {
    fn name(&self) -> &str {
        "ask_user"
    }

    fn description(&self) -> &str {
        "Asks the human user a question and returns their response."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to ask the user."
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let question = arguments["question"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'question' argument".into()))?
            .to_string();

        let prompter = self.prompter.clone();
        let answer = tokio::task::spawn_blocking(move || prompter(&question))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "ask_user".into(),
                reason: e.to_string(),
            })?;

        match answer {
            Ok(Some(response)) => Ok(ToolResult::ok(json!({ "response": response }))),
            Ok(None) => Ok(ToolResult::failed(json!({
                "error": "User interrupted or input closed."
            }))),
            Err(e) => Ok(ToolResult::failed(json!({
                "error": format!("Input error: {e}")
            }))),
        }
    }
}
