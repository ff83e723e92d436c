//! File write tool: write or create files, refusing silent overwrites.

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Danger, Tool, ToolResult};

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Writes content to a specified file. Creates directories if needed. Requires user approval."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative or absolute path to the file to write."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Whether to overwrite the file if it exists.",
                    "default": false
                }
            },
            "required": ["path", "content"]
        })
    }

    fn danger(&self) -> Option<Danger> {
        Some(Danger {
            action: "Write to File",
            detail_arg: Some("path"),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;
        let overwrite = arguments["overwrite"].as_bool().unwrap_or(false);

        let target = Path::new(path);
        if target.is_dir() {
            return Ok(write_failed(format!("path is a directory: {path}")));
        }
        if target.exists() && !overwrite {
            return Ok(write_failed(format!("file exists, overwrite=false: {path}")));
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty())
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(write_failed(format!("cannot create directory: {e}")));
        }

        match tokio::fs::write(path, content).await {
            Ok(()) => Ok(ToolResult::ok(json!({
                "success": true,
                "bytes_written": content.len(),
            }))),
            Err(e) => Ok(write_failed(e.to_string())),
        }
    }
}

fn write_failed(reason: String) -> ToolResult {
    ToolResult::failed(json!({
        "success": false,
        "error": format!("Write failed: {reason}"),
    }))
}
