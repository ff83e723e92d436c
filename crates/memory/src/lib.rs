//! Memory node stores for TagClaw.
//!
//! [`NodeSet`] carries the CRUD rules; the stores wrap it with locking and,
//! for [`FileNodeStore`], persistence.

pub mod node_set;
pub mod in_memory;
pub mod file_store;

pub use node_set::NodeSet;
pub use in_memory::InMemoryNodeStore;
pub use file_store::FileNodeStore;
