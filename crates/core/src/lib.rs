//! # TagClaw Core
//!
//! Domain types, traits, and error definitions for the TagClaw agent.
//! This crate has **no framework dependencies**: it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the dispatch loop is a trait here (model provider,
//! tool, approval gate, memory store). Implementations live in their
//! respective crates, which keeps the loop testable with scripted stand-ins.

pub mod approval;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use approval::{ApprovalGate, ApprovalRequest, AutoApprove, AutoDeny, Decision};
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use memory::{MemoryNode, MemoryStore, NewNode, NodeUpdate, RetrieveQuery, ListQuery, NodePage};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Danger, Tool, ToolCall, ToolRegistry, ToolResult};
