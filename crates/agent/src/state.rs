//! Where the dispatch loop is within a turn.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// Waiting for the model's next message. Initial state of every turn.
    AwaitingModel,
    /// Working through the tool calls of one assistant message.
    ProcessingToolCalls,
    /// Blocked on the approval gate for a dangerous call.
    AwaitingApproval,
    /// The turn ended, with a final answer or a transport failure.
    Done,
    /// The session driver stopped taking input.
    SessionEnded,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoopState::AwaitingModel => "awaiting_model",
            LoopState::ProcessingToolCalls => "processing_tool_calls",
            LoopState::AwaitingApproval => "awaiting_approval",
            LoopState::Done => "done",
            LoopState::SessionEnded => "session_ended",
        };
        f.write_str(label)
    }
}
