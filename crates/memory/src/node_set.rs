//! The tag-indexed node collection shared by every store backend.
//!
//! `NodeSet` holds the CRUD rules (validation, AND matching, ordering,
//! tag arithmetic, timestamp monotonicity) with no I/O. Backends wrap it in a
//! lock and decide what to do after a mutation.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tagclaw_core::error::MemoryError;
use tagclaw_core::memory::{
    DeletedNode, ListQuery, MemoryNode, NewNode, NodePage, NodeUpdate, RetrieveQuery,
};
use uuid::Uuid;

/// node_id → node. Serializes as a flat JSON object, which is the on-disk
/// format of the memory file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeSet {
    nodes: HashMap<String, MemoryNode>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, node_id: &str) -> Option<&MemoryNode> {
        self.nodes.get(node_id)
    }

    /// Check that every record is filed under its own id.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (key, node) in &self.nodes {
            if key != &node.node_id {
                return Err(format!(
                    "record filed under '{key}' has node_id '{}'",
                    node.node_id
                ));
            }
            if node.updated_at < node.created_at {
                return Err(format!("node '{key}' was updated before it was created"));
            }
        }
        Ok(())
    }

    pub fn create(&mut self, new: NewNode) -> Result<MemoryNode, MemoryError> {
        if new.tags.is_empty() {
            return Err(MemoryError::Validation(
                "a node needs at least one tag".into(),
            ));
        }
        let tags = normalize_tags(&new.tags, "tags")?;

        let now = Utc::now();
        let node = MemoryNode {
            node_id: Uuid::new_v4().to_string(),
            tags,
            content: new.content,
            source_chat: new.source_chat,
            created_at: now,
            updated_at: now,
        };
        self.nodes.insert(node.node_id.clone(), node.clone());
        Ok(node)
    }

    pub fn retrieve(&self, query: &RetrieveQuery) -> Result<Vec<MemoryNode>, MemoryError> {
        if query.match_all_tags.is_empty() {
            return Err(MemoryError::Validation(
                "'match_all_tags' cannot be empty for retrieval".into(),
            ));
        }

        let mut hits = self.matching(&query.match_all_tags);
        if let Some(needle) = &query.query_in_content {
            hits.retain(|n| n.content.contains(needle.as_str()));
        }
        if let Some(limit) = query.limit {
            hits.truncate(limit);
        }
        Ok(hits.into_iter().cloned().collect())
    }

    pub fn update(&mut self, node_id: &str, update: NodeUpdate) -> Result<MemoryNode, MemoryError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| MemoryError::NotFound(node_id.to_string()))?;

        let add = normalize_tags(&update.add_tags, "add_tags")?;
        let remove = normalize_tags(&update.remove_tags, "remove_tags")?;

        let mut tags = node.tags.clone();
        for tag in add {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags.retain(|t| !remove.contains(t));

        if tags.is_empty() {
            return Err(MemoryError::Validation(format!(
                "update would leave node '{node_id}' without tags"
            )));
        }

        let updated_at = next_timestamp(node.updated_at);
        let Some(node) = self.nodes.get_mut(node_id) else {
            return Err(MemoryError::NotFound(node_id.to_string()));
        };
        if let Some(content) = update.new_content {
            node.content = content;
        }
        node.tags = tags;
        node.updated_at = updated_at;
        Ok(node.clone())
    }

    pub fn delete(&mut self, node_id: &str) -> Result<DeletedNode, MemoryError> {
        self.nodes
            .remove(node_id)
            .map(|node| DeletedNode::from_node(&node))
            .ok_or_else(|| MemoryError::NotFound(node_id.to_string()))
    }

    pub fn list(&self, query: &ListQuery) -> NodePage {
        let hits = self.matching(&query.filter_match_all_tags);
        let total_matching = hits.len();
        let window = hits
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        NodePage {
            nodes: window,
            total_matching,
            offset: query.offset,
            limit: query.limit,
        }
    }

    /// Nodes carrying all of `tags`, oldest first. Empty `tags` matches all.
    fn matching(&self, tags: &[String]) -> Vec<&MemoryNode> {
        let mut hits: Vec<&MemoryNode> = self
            .nodes
            .values()
            .filter(|n| n.has_all_tags(tags))
            .collect();
        hits.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        hits
    }
}

/// Reject empty tags and drop duplicates, keeping first-seen order.
fn normalize_tags(tags: &[String], field: &str) -> Result<Vec<String>, MemoryError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(MemoryError::Validation(format!(
                "'{field}' contains an empty tag"
            )));
        }
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    Ok(out)
}

/// `now`, bumped past `previous` if the clock has not moved.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
