//! Shell tool: execute system commands.
//!
//! Runs through `sh -c` (`cmd /C` on Windows) with an optional working
//! directory and a timeout. Always gated by approval.

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Danger, Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct ShellTool;

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "execute_shell_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its stdout, stderr, and exit code. Use OS-specific \
         commands (cmd.exe on Windows, sh on Linux/macOS). Requires user approval."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command string to execute."
                },
                "working_directory": {
                    "type": "string",
                    "description": "Optional directory path to execute the command in."
                },
                "timeout_seconds": {
                    "type": "integer",
                    "description": "Optional timeout in seconds.",
                    "default": DEFAULT_TIMEOUT_SECS
                }
            },
            "required": ["command"]
        })
    }

    fn danger(&self) -> Option<Danger> {
        Some(Danger {
            action: "Execute Shell Command",
            detail_arg: Some("command"),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;
        let timeout = arguments["timeout_seconds"]
            .as_u64()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };

        if let Some(dir) = arguments["working_directory"].as_str() {
            if !Path::new(dir).is_dir() {
                return Ok(ToolResult::failed(json!({
                    "error": format!("Working directory not found: {dir}"),
                    "exit_code": -2,
                })));
            }
            cmd.current_dir(dir);
        }

        debug!(command = %command, timeout, "Executing shell command");
        run_captured(self.name(), cmd, timeout).await
    }
}

/// Run a prepared command, capturing trimmed stdout/stderr and the exit code.
///
/// The child is killed if it outlives `timeout_secs`.
pub(crate) async fn run_captured(
    tool_name: &str,
    mut cmd: Command,
    timeout_secs: u64,
) -> Result<ToolResult, ToolError> {
    cmd.kill_on_drop(true);

    let output = match tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(ToolError::ExecutionFailed {
                tool_name: tool_name.into(),
                reason: e.to_string(),
            });
        }
        Err(_) => {
            warn!(tool = tool_name, timeout_secs, "Process timed out");
            return Err(ToolError::Timeout {
                tool_name: tool_name.into(),
                timeout_secs,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    let payload = json!({
        "stdout": stdout,
        "stderr": stderr,
        "exit_code": exit_code,
    });

    if output.status.success() {
        Ok(ToolResult::ok(payload))
    } else {
        debug!(tool = tool_name, exit_code, "Process exited with failure");
        Ok(ToolResult::failed(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_dangerous() {
        let danger = ShellTool.danger().unwrap();
        assert_eq!(danger.action, "Execute Shell Command");
        assert_eq!(danger.detail_arg, Some("command"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn execute_echo() {
        let result = ShellTool
            .execute(json!({"command": "echo hello"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.payload["stdout"], "hello");
        assert_eq!(result.payload["exit_code"], 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_reported() {
        let result = ShellTool
            .execute(json!({"command": "echo oops >&2; exit 3"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.payload["exit_code"], 3);
        assert_eq!(result.payload["stderr"], "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let result = ShellTool
            .execute(json!({
                "command": "ls",
                "working_directory": dir.path().to_str().unwrap()
            }))
            .await
            .unwrap();
        assert!(result.payload["stdout"].as_str().unwrap().contains("marker.txt"));
    }

    #[tokio::test]
    async fn missing_working_directory() {
        let result = ShellTool
            .execute(json!({
                "command": "echo hi",
                "working_directory": "/definitely/not/here"
            }))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.payload["exit_code"], -2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_command() {
        let err = ShellTool
            .execute(json!({"command": "sleep 5", "timeout_seconds": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { timeout_secs: 1, .. }));
    }
}
