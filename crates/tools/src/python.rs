//! Python tool: run a code snippet in a separate interpreter process.

use async_trait::async_trait;
use serde_json::json;
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Danger, Tool, ToolResult};
use tokio::process::Command;
use tracing::debug;

use crate::shell::run_captured;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct PythonTool {
    interpreter: String,
}

impl PythonTool {
    pub fn new() -> Self {
        let interpreter = if cfg!(target_os = "windows") { "python" } else { "python3" };
        Self::with_interpreter(interpreter)
    }

    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        "execute_python_code"
    }

    fn description(&self) -> &str {
        "Executes a given snippet of Python code in a separate process and returns its stdout and \
         stderr. WARNING: runs with the agent's permissions. Requires user approval."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python code snippet to execute."
                },
                "timeout_seconds": {
                    "type": "integer",
                    "description": "Optional timeout in seconds for the execution.",
                    "default": DEFAULT_TIMEOUT_SECS
                }
            },
            "required": ["code"]
        })
    }

    fn danger(&self) -> Option<Danger> {
        Some(Danger {
            action: "Execute Python Code",
            detail_arg: Some("code"),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let code = arguments["code"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'code' argument".into()))?;
        if code.trim().is_empty() {
            return Ok(ToolResult::failed(json!({"error": "No code provided to execute."})));
        }
        let timeout = arguments["timeout_seconds"]
            .as_u64()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut cmd = Command::new(&self.interpreter);
        cmd.args(["-c", code]);

        debug!(interpreter = %self.interpreter, bytes = code.len(), "Executing Python code");
        run_captured(self.name(), cmd, timeout).await
    }
}
