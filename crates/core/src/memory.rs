//! Memory trait: a persistent, tag-indexed node store.
//!
//! The agent keeps facts across sessions as *nodes*: a piece of content
//! labelled with tags. Lookup is exact-string tag intersection (a node
//! matches only if it carries every requested tag) with an optional
//! substring filter on content. There is no ranking and no semantic search.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::MemoryError;

/// A single memory node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    /// Unique, immutable ID
    pub node_id: String,

    /// Labels for exact-match lookup, in insertion order, no duplicates
    pub tags: Vec<String>,

    pub content: String,

    /// Where the information came from (chat id, date, ...)
    #[serde(default)]
    pub source_chat: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every update; always >= `created_at`
    pub updated_at: DateTime<Utc>,
}

impl MemoryNode {
    /// True if the node carries every one of `required` (AND semantics).
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        required.iter().all(|t| self.tags.contains(t))
    }
}

/// Input for creating a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewNode {
    pub tags: Vec<String>,
    pub content: String,
    #[serde(default)]
    pub source_chat: Option<String>,
}

/// Scoped lookup. `match_all_tags` must not be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieveQuery {
    pub match_all_tags: Vec<String>,

    /// Case-sensitive substring the content must contain
    #[serde(default)]
    pub query_in_content: Option<String>,

    #[serde(default)]
    pub limit: Option<usize>,
}

/// Changes to apply to an existing node.
///
/// `add_tags` is applied before `remove_tags`, so a tag named in both ends up
/// removed. Removing a tag the node does not have is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeUpdate {
    #[serde(default)]
    pub new_content: Option<String>,
    #[serde(default)]
    pub add_tags: Vec<String>,
    #[serde(default)]
    pub remove_tags: Vec<String>,
}

/// Browsing query; the tag filter is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter_match_all_tags: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// One window of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePage {
    pub nodes: Vec<MemoryNode>,

    /// Number of nodes matching the filter before windowing
    pub total_matching: usize,

    pub offset: usize,

    pub limit: Option<usize>,
}

/// Confirmation returned by a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedNode {
    pub node_id: String,
    pub tags: Vec<String>,
    pub content_preview: String,
}

impl DeletedNode {
    const PREVIEW_CHARS: usize = 50;

    pub fn from_node(node: &MemoryNode) -> Self {
        let mut content_preview: String = node.content.chars().take(Self::PREVIEW_CHARS).collect();
        if node.content.chars().count() > Self::PREVIEW_CHARS {
            content_preview.push_str("...");
        }
        Self {
            node_id: node.node_id.clone(),
            tags: node.tags.clone(),
            content_preview,
        }
    }
}

/// The store the memory tools talk to.
///
/// Implementations: JSON file (durable), in-memory (tests, ephemeral runs).
/// Every mutating call finishes its whole read-modify-persist cycle before
/// returning.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    async fn create(&self, node: NewNode) -> Result<MemoryNode, MemoryError>;

    async fn retrieve(&self, query: RetrieveQuery) -> Result<Vec<MemoryNode>, MemoryError>;

    async fn update(&self, node_id: &str, update: NodeUpdate) -> Result<MemoryNode, MemoryError>;

    async fn delete(&self, node_id: &str) -> Result<DeletedNode, MemoryError>;

    async fn list(&self, query: ListQuery) -> Result<NodePage, MemoryError>;

    async fn get(&self, node_id: &str) -> Result<Option<MemoryNode>, MemoryError>;

    async fn count(&self) -> Result<usize, MemoryError>;

    /// Write the full store to its backing medium. No-op for volatile stores.
    async fn flush(&self) -> Result<(), MemoryError> {
        Ok(())
    }
}
