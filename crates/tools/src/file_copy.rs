//! File copy tool.

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Danger, Tool, ToolResult};

pub struct CopyFileTool;

#[async_trait]
impl Tool for CopyFileTool {
    fn name(&self) -> &str {
        "copy_file"
    }

    fn description(&self) -> &str {
        "Copies a source file to a destination path. Creates destination directories if needed. \
         Requires user approval."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "The relative or absolute path of the file to copy."
                },
                "destination_path": {
                    "type": "string",
                    "description": "The relative or absolute path where the file should be copied."
                },
                "overwrite": {
                    "type": "boolean",
                    "description": "Whether to overwrite the destination file if it already exists.",
                    "default": false
                }
            },
            "required": ["source_path", "destination_path"]
        })
    }

    fn danger(&self) -> Option<Danger> {
        Some(Danger {
            action: "Copy File",
            detail_arg: Some("destination_path"),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let source = arguments["source_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'source_path' argument".into()))?;
        let destination = arguments["destination_path"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("Missing 'destination_path' argument".into())
        })?;
        let overwrite = arguments["overwrite"].as_bool().unwrap_or(false);

        if !Path::new(source).is_file() {
            return Ok(copy_failed(format!("source not found or not a file: {source}")));
        }
        let dest = Path::new(destination);
        if dest.is_dir() {
            return Ok(copy_failed(format!("destination is a directory: {destination}")));
        }
        if dest.exists() && !overwrite {
            return Ok(copy_failed(format!(
                "destination exists, overwrite=false: {destination}"
            )));
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty())
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(copy_failed(format!("cannot create directory: {e}")));
        }

        match tokio::fs::copy(source, destination).await {
            Ok(bytes) => Ok(ToolResult::ok(json!({
                "success": true,
                "bytes_copied": bytes,
            }))),
            Err(e) => Ok(copy_failed(e.to_string())),
        }
    }
}

fn copy_failed(reason: String) -> ToolResult {
    ToolResult::failed(json!({
        "success": false,
        "error": format!("Copy failed: {reason}"),
    }))
}
