//! File read tool: return the whole content of a text file.

use async_trait::async_trait;
use serde_json::json;
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Tool, ToolResult};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads the entire content of a specified file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative or absolute path to the file to read."
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;

        if !tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
            return Ok(ToolResult::failed(json!({
                "error": format!("Read failed: not a file: {path}")
            })));
        }

        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(ToolResult::ok(json!({
                "content": String::from_utf8_lossy(&bytes)
            }))),
            Err(e) => Ok(ToolResult::failed(json!({
                "error": format!("Read failed: {e}")
            }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn tool_definition() {
        let schema = ReadFileTool.parameters_schema();
        assert_eq!(schema["required"], json!(["path"]));
        assert!(ReadFileTool.danger().is_none());
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        let mut f = std::fs::File::create(&file_path).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let result = ReadFileTool
            .execute(json!({ "path": file_path.to_str().unwrap() }))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.payload["content"], "Hello, world!\n");
    }

    #[tokio::test]
    async fn read_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReadFileTool
            .execute(json!({ "path": dir.path().join("nope.txt").to_str().unwrap() }))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.payload["error"].as_str().unwrap().contains("Read failed"));
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ReadFileTool
            .execute(json!({ "path": dir.path().to_str().unwrap() }))
            .await
            .unwrap();
        assert!(!result.success);
    }
}
