//! System prompt construction.

use chrono::Local;

/// What the session is doing, stated in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMode {
    Interactive,
    SinglePass,
}

impl TaskMode {
    fn describe(self) -> &'static str {
        match self {
            TaskMode::Interactive => "ready for interactive user requests",
            TaskMode::SinglePass => "executing a single task given by the user",
        }
    }
}

/// `linux x86_64` style description of the host.
pub fn os_info() -> String {
    format!("{} {}", std::env::consts::OS, std::env::consts::ARCH)
}

fn shell_flavour() -> &'static str {
    if cfg!(target_os = "windows") { "cmd.exe" } else { "sh/bash" }
}

const MEMORY_INSTRUCTIONS: &str = "You also have access to a node-based memory that persists \
information across sessions. Assume prior memories exist. Use these tools to manage it:\n\
- `create_memory_node`: store a new piece of information with relevant tags \
(e.g. 'project:alpha', 'user_preference', 'concept:quantum_physics').\n\
- `retrieve_memory_nodes`: find nodes carrying ALL of the given tags, optionally filtered by \
text in the content.\n\
- `update_memory_node`: change the content or tags of a node by its ID.\n\
- `delete_memory_node`: remove a node by its ID.\n\
- `list_memory_nodes`: browse stored nodes, optionally filtered by tags.\n\
Keep content concise and tags descriptive and specific. For example, if the user says their \
favourite book is 'Dune', create a node tagged ['user_preference', 'favorite_book', \
'book_title:Dune'] with content 'User's favourite book is Dune by Frank Herbert'.";

/// Build the system prompt for a session.
pub fn build_system_prompt(mode: TaskMode, tool_names: &[&str], memory_enabled: bool) -> String {
    let mut prompt = format!(
        "You are a helpful coding assistant running in a CLI environment on {os}, {task}. \
         Current date/time: {now}. \
         Available tools: {tools}. \
         Use tools precisely. Adhere to OS-specific commands ('{shell}' syntax). \
         Potentially dangerous actions (file system changes, code/shell execution, web access) \
         require user approval; be clear about what you are asking to do.",
        os = os_info(),
        task = mode.describe(),
        now = Local::now().format("%Y-%m-%d %H:%M:%S"),
        tools = tool_names.join(", "),
        shell = shell_flavour(),
    );

    if memory_enabled {
        prompt.push('\n');
        prompt.push_str(MEMORY_INSTRUCTIONS);
    }
    prompt
}
