//! Hooks for watching a turn as it happens.

use tagclaw_core::message::MessageToolCall;
use tagclaw_core::tool::ToolResult;

use crate::state::LoopState;

/// Receives loop events in order. All methods default to doing nothing.
///
/// Observers only watch; they cannot change what the loop does.
pub trait TurnObserver: Send + Sync {
    fn on_state(&self, _state: LoopState) {}

    /// A call the model asked for, before it is resolved or approved.
    fn on_tool_call(&self, _call: &MessageToolCall) {}

    /// The result recorded for a call, whatever its outcome.
    fn on_tool_result(&self, _call: &MessageToolCall, _result: &ToolResult) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TurnObserver for NoopObserver {}
