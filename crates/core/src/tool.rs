//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! run shell commands, read/write files, fetch web pages, manage memory.
//! The registry is a closed table: a name the model sends either resolves to
//! a registered tool or fails with [`ToolError::NotFound`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;

/// A parsed request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: Value,
}

impl ToolCall {
    /// Parse the raw argument string the model produced.
    ///
    /// An empty string is treated as `{}`; anything else must be valid JSON.
    pub fn parse(id: &str, name: &str, raw_arguments: &str) -> Result<Self, ToolError> {
        let arguments = if raw_arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(raw_arguments).map_err(|e| {
                ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}"))
            })?
        };
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        })
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool did what was asked
    pub success: bool,

    /// Structured output handed back to the model
    pub payload: Value,
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        Self { success: true, payload }
    }

    /// The tool ran but the action failed (missing file, non-zero exit, ...).
    pub fn failed(payload: Value) -> Self {
        Self { success: false, payload }
    }

    /// Serialized form used as the tool message content.
    pub fn to_content(&self) -> String {
        self.payload.to_string()
    }
}

/// Marks a tool as dangerous and describes how to present it for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Danger {
    /// Human label of the action, e.g. "Execute Shell Command"
    pub action: &'static str,

    /// Argument shown as the detail line; the whole argument object is shown
    /// when absent or missing from the call.
    pub detail_arg: Option<&'static str>,
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// `Some` when the tool needs human approval before it runs.
    fn danger(&self) -> Option<Danger> {
        None
    }

    /// Execute the tool with already validated arguments.
    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Get tool definitions to send to the model
/// 2. Resolve and validate tool calls the model requests
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Result<&dyn Tool, ToolError> {
        self.tools
            .get(name)
            .map(|t| t.as_ref())
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Turn a call the model made into a runnable one: resolve the tool,
    /// parse the argument string and check it against the tool's schema.
    ///
    /// An unknown name is reported before any argument problem.
    pub fn prepare(&self, raw: &MessageToolCall) -> Result<(&dyn Tool, ToolCall), ToolError> {
        let tool = self.resolve(&raw.name)?;
        let call = ToolCall::parse(&raw.id, &raw.name, &raw.arguments)?;
        validate_arguments(&tool.parameters_schema(), &call.arguments)?;
        Ok((tool, call))
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check model-supplied arguments against a tool's JSON Schema.
///
/// Supports the subset the built-in tools declare: an object with typed
/// `properties` (`string`, `integer`, `number`, `boolean`, `array` with typed
/// `items`) and a `required` list. `null` for an optional property is
/// accepted and means "not given".
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), ToolError> {
    let Some(args) = arguments.as_object() else {
        return Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".into(),
        ));
    };

    if let Some(required) = schema["required"].as_array() {
        for name in required.iter().filter_map(Value::as_str) {
            match args.get(name) {
                None | Some(Value::Null) => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing required argument '{name}'"
                    )));
                }
                Some(_) => {}
            }
        }
    }

    let Some(properties) = schema["properties"].as_object() else {
        return Ok(());
    };

    for (name, value) in args {
        if value.is_null() {
            continue;
        }
        let Some(spec) = properties.get(name) else {
            continue;
        };
        check_type(name, spec, value)?;
    }

    Ok(())
}

fn check_type(name: &str, spec: &Value, value: &Value) -> Result<(), ToolError> {
    let Some(expected) = spec["type"].as_str() else {
        return Ok(());
    };

    let matches = match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_type(&format!("{name}[{i}]"), &spec["items"], item)?;
                }
                true
            }
            None => false,
        },
        _ => true,
    };

    if matches {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments(format!(
            "argument '{name}' must be of type {expected}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "times": { "type": "integer" },
                    "tags": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(json!({ "text": arguments["text"] })))
        }
    }

    #[test]
    fn registry_register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.resolve("echo").is_ok());
        assert!(matches!(
            registry.resolve("frobnicate"),
            Err(ToolError::NotFound(name)) if name == "frobnicate"
        ));
    }

    #[test]
    fn registry_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[tokio::test]
    async fn prepared_tool_executes() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let raw = MessageToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: r#"{"text":"hello world"}"#.into(),
        };
        let (tool, call) = registry.prepare(&raw).unwrap();
        assert_eq!(call.id, "call_1");
        let result = tool.execute(call.arguments).await.unwrap();
        assert!(result.success);
        assert_eq!(result.payload["text"], "hello world");
    }

    #[test]
    fn prepare_reports_unknown_name_before_bad_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));

        let unknown = MessageToolCall {
            id: "c".into(),
            name: "frobnicate".into(),
            arguments: "{not json".into(),
        };
        assert!(matches!(registry.prepare(&unknown), Err(ToolError::NotFound(_))));

        let malformed = MessageToolCall {
            id: "c".into(),
            name: "echo".into(),
            arguments: "{not json".into(),
        };
        assert!(matches!(registry.prepare(&malformed), Err(ToolError::InvalidArguments(_))));

        let mistyped = MessageToolCall {
            id: "c".into(),
            name: "echo".into(),
            arguments: r#"{"text": 3}"#.into(),
        };
        assert!(matches!(registry.prepare(&mistyped), Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = ToolCall::parse("call_1", "echo", "{not json").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn parse_treats_empty_as_object() {
        let call = ToolCall::parse("call_1", "list_directory", "").unwrap();
        assert!(call.arguments.as_object().unwrap().is_empty());
    }

    #[test]
    fn missing_required_argument() {
        let schema = EchoTool.parameters_schema();
        let err = validate_arguments(&schema, &json!({})).unwrap_err();
        assert!(err.to_string().contains("'text'"));
        let err = validate_arguments(&schema, &json!({"text": null})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let schema = EchoTool.parameters_schema();
        assert!(validate_arguments(&schema, &json!({"text": 5})).is_err());
        assert!(validate_arguments(&schema, &json!({"text": "a", "times": "2"})).is_err());
        assert!(validate_arguments(&schema, &json!({"text": "a", "times": 1.5})).is_err());
        let err = validate_arguments(&schema, &json!({"text": "a", "tags": ["x", 3]})).unwrap_err();
        assert!(err.to_string().contains("tags[1]"));
    }

    #[test]
    fn optional_null_and_unknown_keys_pass() {
        let schema = EchoTool.parameters_schema();
        assert!(validate_arguments(&schema, &json!({"text": "a", "times": null})).is_ok());
        assert!(validate_arguments(&schema, &json!({"text": "a", "extra": true})).is_ok());
    }

    #[test]
    fn non_object_arguments_rejected() {
        let schema = EchoTool.parameters_schema();
        assert!(validate_arguments(&schema, &json!(["text"])).is_err());
    }
}
