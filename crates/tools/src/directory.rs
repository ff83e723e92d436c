//! Directory tools: list contents and create directories.

use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Danger, Tool, ToolResult};

pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "Lists the files and subdirectories within a specified directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative or absolute path to the directory.",
                    "default": "."
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Whether to list contents recursively (use with caution).",
                    "default": false
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = PathBuf::from(arguments["path"].as_str().unwrap_or("."));
        let recursive = arguments["recursive"].as_bool().unwrap_or(false);

        if !path.is_dir() {
            return Ok(ToolResult::failed(json!({
                "error": format!("List failed: not a directory: {}", path.display())
            })));
        }

        let listing = tokio::task::spawn_blocking(move || list_entries(&path, recursive))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "list_directory".into(),
                reason: e.to_string(),
            })?;

        match listing {
            Ok(entries) => Ok(ToolResult::ok(json!({ "entries": entries }))),
            Err(e) => Ok(ToolResult::failed(json!({ "error": format!("List failed: {e}") }))),
        }
    }
}

/// Sorted entry names relative to `root`; directories end with the path separator.
fn list_entries(root: &Path, recursive: bool) -> std::io::Result<Vec<String>> {
    let mut found: Vec<(PathBuf, bool)> = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            let full = entry.path();
            if is_dir && recursive {
                pending.push(full.clone());
            }
            let relative = full.strip_prefix(root).unwrap_or(&full).to_path_buf();
            found.push((relative, is_dir));
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found
        .into_iter()
        .map(|(p, is_dir)| {
            let name = p.display().to_string();
            if is_dir { format!("{name}{MAIN_SEPARATOR}") } else { name }
        })
        .collect())
}

pub struct CreateDirectoryTool;

#[async_trait]
impl Tool for CreateDirectoryTool {
    fn name(&self) -> &str {
        "create_directory"
    }

    fn description(&self) -> &str {
        "Creates a new directory, including any necessary parent directories. Requires user approval."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative or absolute directory path to create."
                }
            },
            "required": ["path"]
        })
    }

    fn danger(&self) -> Option<Danger> {
        Some(Danger {
            action: "Create Directory",
            detail_arg: Some("path"),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        let target = Path::new(path);
        if target.exists() && !target.is_dir() {
            return Ok(ToolResult::failed(json!({
                "success": false,
                "error": format!("Create dir failed: path exists but is a file: {path}"),
            })));
        }

        match tokio::fs::create_dir_all(target).await {
            Ok(()) => Ok(ToolResult::ok(json!({ "success": true }))),
            Err(e) => Ok(ToolResult::failed(json!({
                "success": false,
                "error": format!("Create dir failed: {e}"),
            }))),
        }
    }
}
