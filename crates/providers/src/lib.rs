//! Model provider implementations for TagClaw.
//!
//! All providers implement the `tagclaw_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
