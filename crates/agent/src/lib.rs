//! The dispatch loop of TagClaw.
//!
//! One turn runs like this:
//!
//! 1. **Send** the conversation and tool definitions to the model
//! 2. **If tool calls**: resolve and validate each one, ask the approval gate
//!    for dangerous ones, execute, append the results, go back to step 1
//! 3. **If text**: append it and hand it back to the session driver
//!
//! There is no iteration cap; the turn ends when the model answers with
//! text or the provider fails.

pub mod loop_runner;
pub mod observer;
pub mod prompt;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::AgentLoop;
pub use observer::{NoopObserver, TurnObserver};
pub use prompt::{build_system_prompt, os_info, TaskMode};
pub use state::LoopState;
