//! Built-in tool implementations for TagClaw.
//!
//! Tools give the agent the ability to act: run shell commands and Python
//! snippets, read, write and copy files, browse directories, fetch web
//! pages, ask the user, and (when a memory file is configured) manage
//! memory nodes.

pub mod ask_user;
pub mod directory;
pub mod file_copy;
pub mod file_read;
pub mod file_write;
pub mod memory_nodes;
pub mod python;
pub mod shell;
pub mod web_fetch;

use std::sync::Arc;
use tagclaw_core::memory::MemoryStore;
use tagclaw_core::tool::ToolRegistry;

pub use memory_nodes::memory_tools;

/// Names of the tools that are always registered.
pub const STANDARD_TOOLS: [&str; 9] = [
    "execute_python_code",
    "execute_shell_command",
    "read_file",
    "write_file",
    "copy_file",
    "list_directory",
    "create_directory",
    "fetch_web_page",
    "ask_user",
];

/// Create the tool registry: the nine standard tools, plus the memory tools
/// when a store is given.
pub fn default_registry(memory: Option<Arc<dyn MemoryStore>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(python::PythonTool::new()));
    registry.register(Box::new(shell::ShellTool));
    registry.register(Box::new(file_read::ReadFileTool));
    registry.register(Box::new(file_write::WriteFileTool));
    registry.register(Box::new(file_copy::CopyFileTool));
    registry.register(Box::new(directory::ListDirectoryTool));
    registry.register(Box::new(directory::CreateDirectoryTool));
    registry.register(Box::new(web_fetch::FetchWebPageTool::new()));
    registry.register(Box::new(ask_user::AskUserTool::new()));

    if let Some(store) = memory {
        for tool in memory_tools(store) {
            registry.register(tool);
        }
    }
    registry
}
