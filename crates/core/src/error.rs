//! Error types for the TagClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all TagClaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the model transport. Any of these is fatal to the current
/// turn but leaves the conversation intact.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    /// Malformed arguments, e.g. an empty tag list.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Node with ID '{0}' not found")]
    NotFound(String),

    /// The memory file could not be read, parsed, or written.
    #[error("Persistence failed for {path}: {reason}")]
    Persistence { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// The model asked for a tool that is not registered.
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl ToolError {
    /// Short machine-readable kind, included in error tool results so the
    /// model can tell validation problems from missing nodes.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "unknown_tool",
            ToolError::ExecutionFailed { .. } => "execution_failed",
            ToolError::Timeout { .. } => "timeout",
            ToolError::InvalidArguments(_) => "validation_error",
            ToolError::Memory(MemoryError::Validation(_)) => "validation_error",
            ToolError::Memory(MemoryError::NotFound(_)) => "not_found",
            ToolError::Memory(MemoryError::Persistence { .. }) => "persistence_error",
        }
    }
}
