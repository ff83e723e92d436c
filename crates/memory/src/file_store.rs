//! File-based node store: one pretty-printed JSON object on disk.
//!
//! The whole store lives in memory and is rewritten to disk after every
//! mutation. Writes go to a sibling `.tmp` file which is then renamed over
//! the real one, so a crash mid-write leaves the previous file intact.
//!
//! The path always comes from the caller; relative paths resolve against the
//! working directory.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagclaw_core::error::MemoryError;
use tagclaw_core::memory::{
    DeletedNode, ListQuery, MemoryNode, MemoryStore, NewNode, NodePage, NodeUpdate, RetrieveQuery,
};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::node_set::NodeSet;

struct State {
    nodes: NodeSet,
    /// Set when the last write failed; cleared by the next successful one.
    dirty: bool,
}

/// A memory store mirrored to a single JSON file.
pub struct FileNodeStore {
    path: PathBuf,
    state: Arc<RwLock<State>>,
}

impl FileNodeStore {
    /// Open the store at `path`.
    ///
    /// A missing file gives an empty store (the file is created on the first
    /// write). An unreadable or malformed file is an error; the caller should
    /// refuse to start rather than overwrite it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let path = path.into();
        let nodes = load_from_disk(&path)?;
        info!(path = %path.display(), count = nodes.len(), "Memory file loaded");
        Ok(Self {
            path,
            state: Arc::new(RwLock::new(State { nodes, dirty: false })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the in-memory state has changes the file does not.
    pub async fn is_dirty(&self) -> bool {
        self.state.read().await.dirty
    }

    /// Persist after a mutation. A failed write keeps the mutation in memory
    /// and is retried on the next mutation or the explicit flush.
    fn persist_after_mutation(&self, state: &mut State) {
        match write_to_disk(&self.path, &state.nodes) {
            Ok(()) => state.dirty = false,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to save memory file");
                state.dirty = true;
            }
        }
    }
}

fn persistence_error(path: &Path, reason: impl ToString) -> MemoryError {
    MemoryError::Persistence {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn load_from_disk(path: &Path) -> Result<NodeSet, MemoryError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(NodeSet::new()),
        Err(e) => return Err(persistence_error(path, e)),
    };

    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| persistence_error(path, format!("invalid JSON: {e}")))?;
    if !raw.is_object() {
        return Err(persistence_error(
            path,
            "top level must be a JSON object of node_id to node",
        ));
    }

    let nodes: NodeSet = serde_json::from_value(raw)
        .map_err(|e| persistence_error(path, format!("malformed node record: {e}")))?;
    nodes
        .check_consistency()
        .map_err(|reason| persistence_error(path, reason))?;
    Ok(nodes)
}

fn write_to_disk(path: &Path, nodes: &NodeSet) -> Result<(), MemoryError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| persistence_error(path, format!("cannot create directory: {e}")))?;
    }

    let body = serde_json::to_string_pretty(nodes).map_err(|e| persistence_error(path, e))?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, body).map_err(|e| persistence_error(path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| persistence_error(path, e))?;
    debug!(path = %path.display(), count = nodes.len(), "Memory file written");
    Ok(())
}

#[async_trait]
impl MemoryStore for FileNodeStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn create(&self, node: NewNode) -> Result<MemoryNode, MemoryError> {
        let mut state = self.state.write().await;
        let node = state.nodes.create(node)?;
        self.persist_after_mutation(&mut state);
        Ok(node)
    }

    async fn retrieve(&self, query: RetrieveQuery) -> Result<Vec<MemoryNode>, MemoryError> {
        self.state.read().await.nodes.retrieve(&query)
    }

    async fn update(&self, node_id: &str, update: NodeUpdate) -> Result<MemoryNode, MemoryError> {
        let mut state = self.state.write().await;
        let node = state.nodes.update(node_id, update)?;
        self.persist_after_mutation(&mut state);
        Ok(node)
    }

    async fn delete(&self, node_id: &str) -> Result<DeletedNode, MemoryError> {
        let mut state = self.state.write().await;
        let deleted = state.nodes.delete(node_id)?;
        self.persist_after_mutation(&mut state);
        Ok(deleted)
    }

    async fn list(&self, query: ListQuery) -> Result<NodePage, MemoryError> {
        Ok(self.state.read().await.nodes.list(&query))
    }

    async fn get(&self, node_id: &str) -> Result<Option<MemoryNode>, MemoryError> {
        Ok(self.state.read().await.nodes.get(node_id).cloned())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.state.read().await.nodes.len())
    }

    async fn flush(&self) -> Result<(), MemoryError> {
        let mut state = self.state.write().await;
        write_to_disk(&self.path, &state.nodes)?;
        state.dirty = false;
        Ok(())
    }
}
