//! In-memory store: useful for testing and runs without a memory file.

use async_trait::async_trait;
use std::sync::Arc;
use tagclaw_core::error::MemoryError;
use tagclaw_core::memory::{
    DeletedNode, ListQuery, MemoryNode, MemoryStore, NewNode, NodePage, NodeUpdate, RetrieveQuery,
};
use tokio::sync::RwLock;

use crate::node_set::NodeSet;

/// A store that forgets everything when the process exits.
pub struct InMemoryNodeStore {
    nodes: Arc<RwLock<NodeSet>>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(NodeSet::new())),
        }
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryNodeStore {
    fn name(&self) -> &str { "in_memory" }

    async fn create(&self, node: NewNode) -> Result<MemoryNode, MemoryError> {
        self.nodes.write().await.create(node)
    }

    async fn retrieve(&self, query: RetrieveQuery) -> Result<Vec<MemoryNode>, MemoryError> {
        self.nodes.read().await.retrieve(&query)
    }

    async fn update(&self, node_id: &str, update: NodeUpdate) -> Result<MemoryNode, MemoryError> {
        self.nodes.write().await.update(node_id, update)
    }

    async fn delete(&self, node_id: &str) -> Result<DeletedNode, MemoryError> {
        self.nodes.write().await.delete(node_id)
    }

    async fn list(&self, query: ListQuery) -> Result<NodePage, MemoryError> {
        Ok(self.nodes.read().await.list(&query))
    }

    async fn get(&self, node_id: &str) -> Result<Option<MemoryNode>, MemoryError> {
        Ok(self.nodes.read().await.get(node_id).cloned())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.nodes.read().await.len())
    }
}
