//! Web fetch tool: GET a URL and return its body as text.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tagclaw_core::error::ToolError;
use tagclaw_core::tool::{Danger, Tool, ToolResult};
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct FetchWebPageTool {
    client: reqwest::Client,
}

impl FetchWebPageTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for FetchWebPageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FetchWebPageTool {
    fn name(&self) -> &str {
        "fetch_web_page"
    }

    fn description(&self) -> &str {
        "Fetches the text content of a given URL. Requires user approval."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch (must include http:// or https://)."
                },
                "timeout_seconds": {
                    "type": "integer",
                    "description": "Optional timeout in seconds.",
                    "default": DEFAULT_TIMEOUT_SECS
                }
            },
            "required": ["url"]
        })
    }

    fn danger(&self) -> Option<Danger> {
        Some(Danger {
            action: "Fetch Web Page",
            detail_arg: Some("url"),
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;
        let timeout_secs = arguments["timeout_seconds"]
            .as_u64()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidArguments(
                "URL must start with http:// or https://".into(),
            ));
        }

        debug!(url = %url, timeout_secs, "Fetching web page");

        let response = self
            .client
            .get(url)
            .header("User-Agent", concat!("TagClaw/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool_name: "fetch_web_page".into(),
                        timeout_secs,
                    }
                } else {
                    ToolError::ExecutionFailed {
                        tool_name: "fetch_web_page".into(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: "fetch_web_page".into(),
            reason: format!("failed to read body: {e}"),
        })?;

        if status.is_success() {
            Ok(ToolResult::ok(json!({
                "status_code": status.as_u16(),
                "content": body,
            })))
        } else {
            Ok(ToolResult::failed(json!({
                "status_code": status.as_u16(),
                "error": format!("Fetch failed with status {status}"),
                "content": body,
            })))
        }
    }
}
