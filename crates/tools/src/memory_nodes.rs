//! Memory node tools: let the agent create, find, edit and forget nodes.
//!
//! Each tool is a thin adapter over the shared [`MemoryStore`]: arguments
//! are decoded from the model's JSON, store errors surface as
//! [`ToolError::Memory`] so the loop can report them with their kind.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tagclaw_core::error::ToolError;
use tagclaw_core::memory::{ListQuery, MemoryStore, NewNode, NodeUpdate, RetrieveQuery};
use tagclaw_core::tool::{Tool, ToolResult};

fn string_list(arguments: &Value, key: &str) -> Result<Vec<String>, ToolError> {
    match &arguments[key] {
        Value::Null => Ok(Vec::new()),
        value => serde_json::from_value(value.clone()).map_err(|_| {
            ToolError::InvalidArguments(format!("'{key}' must be a list of strings"))
        }),
    }
}

fn optional_string(arguments: &Value, key: &str) -> Option<String> {
    arguments[key].as_str().map(str::to_string)
}

fn optional_count(arguments: &Value, key: &str) -> Result<Option<usize>, ToolError> {
    match &arguments[key] {
        Value::Null => Ok(None),
        value => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' must be a non-negative integer"))),
    }
}

fn required_id(arguments: &Value) -> Result<&str, ToolError> {
    arguments["node_id"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'node_id' argument".into()))
}

fn tag_array_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description
    })
}

/// `create_memory_node`
pub struct CreateMemoryNodeTool {
    store: Arc<dyn MemoryStore>,
}

impl CreateMemoryNodeTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CreateMemoryNodeTool {
    fn name(&self) -> &str {
        "create_memory_node"
    }

    fn description(&self) -> &str {
        "Creates a new memory node. Nodes store a piece of information with tags for later \
         retrieval."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tags": tag_array_schema(
                    "Tags to associate with the node (e.g., ['project:alpha', 'user_id:123', 'todo'])."
                ),
                "content": {
                    "type": "string",
                    "description": "The textual content of the memory node."
                },
                "source_chat": {
                    "type": "string",
                    "description": "Optional: where this information came from (chat ID, date, session)."
                }
            },
            "required": ["tags", "content"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let new = NewNode {
            tags: string_list(&arguments, "tags")?,
            content: optional_string(&arguments, "content")
                .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?,
            source_chat: optional_string(&arguments, "source_chat"),
        };

        let node = self.store.create(new).await?;
        Ok(ToolResult::ok(json!({
            "status": "created",
            "node_id": node.node_id,
            "node": node,
        })))
    }
}

/// `retrieve_memory_nodes`
pub struct RetrieveMemoryNodesTool {
    store: Arc<dyn MemoryStore>,
}

impl RetrieveMemoryNodesTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RetrieveMemoryNodesTool {
    fn name(&self) -> &str {
        "retrieve_memory_nodes"
    }

    fn description(&self) -> &str {
        "Retrieves memory nodes that carry ALL of the given tags, oldest first. Optionally filters \
         by a case-sensitive substring of the content. Returns full node objects."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "match_all_tags": tag_array_schema(
                    "Nodes must have ALL of these tags to be returned. Must not be empty."
                ),
                "query_in_content": {
                    "type": "string",
                    "description": "Optional: text that must appear in the node content (case-sensitive)."
                },
                "limit": {
                    "type": "integer",
                    "description": "Optional: maximum number of nodes to return."
                }
            },
            "required": ["match_all_tags"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let query = RetrieveQuery {
            match_all_tags: string_list(&arguments, "match_all_tags")?,
            query_in_content: optional_string(&arguments, "query_in_content"),
            limit: optional_count(&arguments, "limit")?,
        };

        let nodes = self.store.retrieve(query).await?;
        Ok(ToolResult::ok(json!({
            "count": nodes.len(),
            "nodes": nodes,
        })))
    }
}

/// `update_memory_node`
pub struct UpdateMemoryNodeTool {
    store: Arc<dyn MemoryStore>,
}

impl UpdateMemoryNodeTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateMemoryNodeTool {
    fn name(&self) -> &str {
        "update_memory_node"
    }

    fn description(&self) -> &str {
        "Updates an existing memory node by its ID. Tags in add_tags are added first, then tags in \
         remove_tags are removed. A node must keep at least one tag."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "node_id": {
                    "type": "string",
                    "description": "The ID of the memory node to update."
                },
                "new_content": {
                    "type": "string",
                    "description": "Optional: new content for the node. Omit to keep the current content."
                },
                "add_tags": tag_array_schema("Optional: tags to add. Duplicates are ignored."),
                "remove_tags": tag_array_schema("Optional: tags to remove.")
            },
            "required": ["node_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let node_id = required_id(&arguments)?;
        let update = NodeUpdate {
            new_content: optional_string(&arguments, "new_content"),
            add_tags: string_list(&arguments, "add_tags")?,
            remove_tags: string_list(&arguments, "remove_tags")?,
        };

        let node = self.store.update(node_id, update).await?;
        Ok(ToolResult::ok(json!({
            "status": "updated",
            "node_id": node.node_id,
            "node": node,
        })))
    }
}

/// `delete_memory_node`
pub struct DeleteMemoryNodeTool {
    store: Arc<dyn MemoryStore>,
}

impl DeleteMemoryNodeTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DeleteMemoryNodeTool {
    fn name(&self) -> &str {
        "delete_memory_node"
    }

    fn description(&self) -> &str {
        "Deletes a memory node by its ID."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "node_id": {
                    "type": "string",
                    "description": "The ID of the memory node to delete."
                }
            },
            "required": ["node_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let node_id = required_id(&arguments)?;
        let details = self.store.delete(node_id).await?;
        Ok(ToolResult::ok(json!({
            "status": "deleted",
            "node_id": details.node_id,
            "details": details,
        })))
    }
}

/// `list_memory_nodes`
pub struct ListMemoryNodesTool {
    store: Arc<dyn MemoryStore>,
}

impl ListMemoryNodesTool {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListMemoryNodesTool {
    fn name(&self) -> &str {
        "list_memory_nodes"
    }

    fn description(&self) -> &str {
        "Lists memory nodes oldest first, optionally only those carrying ALL of the given tags. \
         Supports paging with limit and offset."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filter_match_all_tags": tag_array_schema(
                    "Optional: only nodes having ALL these tags are listed."
                ),
                "limit": {
                    "type": "integer",
                    "description": "Optional: maximum number of nodes to return."
                },
                "offset": {
                    "type": "integer",
                    "description": "Number of nodes to skip for pagination.",
                    "default": 0
                }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let query = ListQuery {
            filter_match_all_tags: string_list(&arguments, "filter_match_all_tags")?,
            limit: optional_count(&arguments, "limit")?,
            offset: optional_count(&arguments, "offset")?.unwrap_or(0),
        };

        let page = self.store.list(query).await?;
        Ok(ToolResult::ok(json!({
            "count_returned": page.nodes.len(),
            "total_matching": page.total_matching,
            "limit": page.limit,
            "offset": page.offset,
            "nodes": page.nodes,
        })))
    }
}

/// All five memory tools over one store.
pub fn memory_tools(store: Arc<dyn MemoryStore>) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(CreateMemoryNodeTool::new(store.clone())),
        Box::new(RetrieveMemoryNodesTool::new(store.clone())),
        Box::new(UpdateMemoryNodeTool::new(store.clone())),
        Box::new(DeleteMemoryNodeTool::new(store.clone())),
        Box::new(ListMemoryNodesTool::new(store)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagclaw_core::error::MemoryError;
    use tagclaw_memory::InMemoryNodeStore;

    fn store() -> Arc<dyn MemoryStore> {
        Arc::new(InMemoryNodeStore::new())
    }

    async fn create(store: &Arc<dyn MemoryStore>, tags: Value, content: &str) -> String {
        let result = CreateMemoryNodeTool::new(store.clone())
            .execute(json!({ "tags": tags, "content": content }))
            .await
            .unwrap();
        result.payload["node_id"].as_str().unwrap().to_string()
    }

    #[test]
    fn none_are_dangerous() {
        for tool in memory_tools(store()) {
            assert!(tool.danger().is_none(), "{} should not need approval", tool.name());
        }
    }

    #[tokio::test]
    async fn create_reports_status_and_node() {
        let store = store();
        let result = CreateMemoryNodeTool::new(store.clone())
            .execute(json!({
                "tags": ["project:Aquila", "deadline"],
                "content": "deadline is next Friday",
                "source_chat": "chat-42"
            }))
            .await
            .unwrap();

        assert_eq!(result.payload["status"], "created");
        assert_eq!(result.payload["node"]["source_chat"], "chat-42");
        assert_eq!(
            result.payload["node_id"],
            result.payload["node"]["node_id"]
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_with_no_tags_is_validation_error() {
        let err = CreateMemoryNodeTool::new(store())
            .execute(json!({ "tags": [], "content": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn retrieve_matches_all_tags() {
        let store = store();
        let id = create(&store, json!(["project:Aquila", "deadline"]), "deadline is next Friday").await;
        create(&store, json!(["project:Aquila"]), "kickoff notes").await;

        let tool = RetrieveMemoryNodesTool::new(store.clone());
        let hit = tool
            .execute(json!({ "match_all_tags": ["project:Aquila", "deadline"] }))
            .await
            .unwrap();
        assert_eq!(hit.payload["count"], 1);
        assert_eq!(hit.payload["nodes"][0]["node_id"], id.as_str());

        let miss = tool
            .execute(json!({ "match_all_tags": ["project:Aquila", "urgent"] }))
            .await
            .unwrap();
        assert_eq!(miss.payload["count"], 0);
        assert_eq!(miss.payload["nodes"], json!([]));
    }

    #[tokio::test]
    async fn retrieve_with_empty_tags_fails() {
        let err = RetrieveMemoryNodesTool::new(store())
            .execute(json!({ "match_all_tags": [] }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Memory(MemoryError::Validation(_))));
    }

    #[tokio::test]
    async fn update_moves_node_between_tags() {
        let store = store();
        let id = create(&store, json!(["project:Aquila", "deadline"]), "deadline is next Friday").await;

        let result = UpdateMemoryNodeTool::new(store.clone())
            .execute(json!({
                "node_id": id,
                "add_tags": ["done"],
                "remove_tags": ["deadline"]
            }))
            .await
            .unwrap();
        assert_eq!(result.payload["status"], "updated");
        assert_eq!(result.payload["node"]["tags"], json!(["project:Aquila", "done"]));

        let retrieve = RetrieveMemoryNodesTool::new(store.clone());
        let old = retrieve.execute(json!({ "match_all_tags": ["deadline"] })).await.unwrap();
        assert_eq!(old.payload["count"], 0);
        let done = retrieve.execute(json!({ "match_all_tags": ["done"] })).await.unwrap();
        assert_eq!(done.payload["nodes"][0]["node_id"], id.as_str());
    }

    #[tokio::test]
    async fn update_unknown_is_not_found() {
        let err = UpdateMemoryNodeTool::new(store())
            .execute(json!({ "node_id": "missing", "new_content": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn delete_returns_details_then_not_found() {
        let store = store();
        let id = create(&store, json!(["tmp"]), "short lived").await;
        let tool = DeleteMemoryNodeTool::new(store.clone());

        let result = tool.execute(json!({ "node_id": id })).await.unwrap();
        assert_eq!(result.payload["status"], "deleted");
        assert_eq!(result.payload["details"]["content_preview"], "short lived");

        let err = tool.execute(json!({ "node_id": id })).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn list_pages_through_nodes() {
        let store = store();
        for i in 0..5 {
            create(&store, json!(["n"]), &format!("note {i}")).await;
        }

        let tool = ListMemoryNodesTool::new(store.clone());
        let all = tool.execute(json!({})).await.unwrap();
        assert_eq!(all.payload["total_matching"], 5);
        assert_eq!(all.payload["count_returned"], 5);
        assert_eq!(all.payload["limit"], Value::Null);

        let page = tool.execute(json!({ "limit": 2, "offset": 4 })).await.unwrap();
        assert_eq!(page.payload["count_returned"], 1);
        assert_eq!(page.payload["offset"], 4);
        assert_eq!(page.payload["limit"], 2);
    }

    #[tokio::test]
    async fn negative_offset_is_rejected() {
        let err = ListMemoryNodesTool::new(store())
            .execute(json!({ "offset": -1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
