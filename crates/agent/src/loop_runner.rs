//! The agent dispatch loop implementation.

use std::sync::{Arc, Mutex};
use serde_json::json;
use tagclaw_core::approval::{ApprovalGate, ApprovalRequest};
use tagclaw_core::error::ToolError;
use tagclaw_core::message::{Conversation, Message, MessageToolCall, Role};
use tagclaw_core::provider::{Provider, ProviderRequest};
use tagclaw_core::tool::{ToolRegistry, ToolResult};
use tracing::{debug, info, warn};

use crate::observer::{NoopObserver, TurnObserver};
use crate::state::LoopState;

/// Content of the tool message recorded when the human says no.
pub fn denied_result() -> ToolResult {
    ToolResult::failed(json!({
        "error": "Action denied by user.",
        "skipped": true,
    }))
}

/// Tool message content for a call that could not be carried out.
pub fn error_result(error: &ToolError) -> ToolResult {
    ToolResult::failed(json!({
        "error": error.to_string(),
        "kind": error.kind(),
    }))
}

/// Orchestrates model calls, approval and tool execution for one session.
pub struct AgentLoop {
    /// The model provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    temperature: f32,

    top_p: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// Consulted before any dangerous tool runs
    approval: Arc<dyn ApprovalGate>,

    /// Inserted at the head of conversations that lack one
    system_prompt: Option<String>,

    observer: Arc<dyn TurnObserver>,

    state: Mutex<LoopState>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        top_p: f32,
        tools: Arc<ToolRegistry>,
        approval: Arc<dyn ApprovalGate>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            top_p,
            max_tokens: None,
            tools,
            approval,
            system_prompt: None,
            observer: Arc::new(NoopObserver),
            state: Mutex::new(LoopState::AwaitingModel),
        }
    }

    /// Set the default max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Attach an observer for tool calls, results and state changes.
    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> LoopState {
        self.state.lock().map(|s| *s).unwrap_or(LoopState::Done)
    }

    fn set_state(&self, next: LoopState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
        self.observer.on_state(next);
    }

    /// Mark the session as finished. Called by the session driver on quit,
    /// end of input, or a fatal error.
    pub fn end_session(&self) {
        self.set_state(LoopState::SessionEnded);
    }

    /// Run one turn: call the model, carry out any tool calls it makes, and
    /// repeat until it answers with text.
    ///
    /// A provider failure ends the turn with `Error::Provider`; every message
    /// appended before the failure stays in the conversation so the user can
    /// retry.
    pub async fn process(
        &self,
        conversation: &mut Conversation,
    ) -> Result<String, tagclaw_core::Error> {
        info!(
            conversation_id = %conversation.id,
            messages = conversation.len(),
            "Processing conversation"
        );

        if let Some(prompt) = &self.system_prompt
            && conversation.messages.first().is_none_or(|m| m.role != Role::System)
        {
            conversation.messages.insert(0, Message::system(prompt.clone()));
        }

        let tool_definitions = self.tools.definitions();
        let mut round = 0u32;

        loop {
            round += 1;
            self.set_state(LoopState::AwaitingModel);
            debug!(
                conversation_id = %conversation.id,
                round,
                "Requesting model response"
            );

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: conversation.messages.clone(),
                temperature: self.temperature,
                top_p: self.top_p,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(provider = self.provider.name(), error = %e, "Model call failed");
                    self.set_state(LoopState::Done);
                    return Err(e.into());
                }
            };

            if let Some(usage) = &response.usage {
                debug!(
                    model = %response.model,
                    total_tokens = usage.total_tokens,
                    "Model responded"
                );
            }

            if response.message.tool_calls.is_empty() {
                let text = response.message.content.clone();
                conversation.push(response.message);
                self.set_state(LoopState::Done);
                return Ok(text);
            }

            debug!(
                tool_count = response.message.tool_calls.len(),
                "Processing tool calls"
            );
            let tool_calls = response.message.tool_calls.clone();
            conversation.push(response.message);
            self.set_state(LoopState::ProcessingToolCalls);

            for call in &tool_calls {
                self.observer.on_tool_call(call);
                let result = self.dispatch(call).await;
                self.observer.on_tool_result(call, &result);
                conversation.push(Message::tool_result(&call.id, &call.name, result.to_content()));
            }
        }
    }

    /// Resolve, validate, approve and run a single call. Never fails: every
    /// outcome becomes a result the model can read.
    async fn dispatch(&self, raw: &MessageToolCall) -> ToolResult {
        let (tool, call) = match self.tools.prepare(raw) {
            Ok(prepared) => prepared,
            Err(e @ ToolError::NotFound(_)) => {
                warn!(tool = %raw.name, "Model requested an unknown tool");
                return error_result(&e);
            }
            Err(e) => {
                warn!(tool = %raw.name, error = %e, "Rejected tool arguments");
                return error_result(&e);
            }
        };

        if let Some(danger) = tool.danger() {
            self.set_state(LoopState::AwaitingApproval);
            let request = ApprovalRequest::new(&call.name, &danger, &call.arguments);
            let decision = self.approval.confirm(&request).await;
            self.set_state(LoopState::ProcessingToolCalls);

            if !decision.is_approved() {
                info!(tool = %call.name, action = %request.describe(), "Action denied");
                return denied_result();
            }
            info!(tool = %call.name, action = %request.describe(), "Action approved");
        }

        let start = std::time::Instant::now();
        let outcome = tool.execute(call.arguments).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                debug!(tool = %call.name, success = result.success, duration_ms, "Tool finished");
                result
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, duration_ms, "Tool execution failed");
                error_result(&e)
            }
        }
    }
}
