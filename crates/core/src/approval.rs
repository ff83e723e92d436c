//! Approval gate: human confirmation before dangerous tools run.
//!
//! The dispatch loop only consults the gate for tools whose
//! [`Tool::danger`](crate::tool::Tool::danger) is `Some`. A denial is a
//! normal outcome, not an error: the loop turns it into a tool result telling
//! the model the action was skipped.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use crate::tool::Danger;

/// What the gate is asked to confirm.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalRequest {
    pub tool_name: String,

    /// Human label of the action ("Write to File")
    pub action: String,

    /// The single most relevant argument, rendered as text
    pub detail: String,

    /// Full argument object, for gates that want to show everything
    pub arguments: Value,
}

impl ApprovalRequest {
    /// Build the request for a dangerous call.
    ///
    /// Uses the tool's detail argument when present (strings are shown
    /// verbatim), and falls back to the whole argument object.
    pub fn new(tool_name: &str, danger: &Danger, arguments: &Value) -> Self {
        let detail = danger
            .detail_arg
            .and_then(|arg| arguments.get(arg))
            .filter(|v| !v.is_null())
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            })
            .unwrap_or_else(|| arguments.to_string());

        Self {
            tool_name: tool_name.to_string(),
            action: danger.action.to_string(),
            detail,
            arguments: arguments.clone(),
        }
    }

    /// One-line description, used in logs.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.action, self.detail)
    }
}

/// The human's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub fn is_approved(self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Obtains a go/no-go decision for a dangerous action.
///
/// Implementations must treat anything other than an explicit affirmative as
/// [`Decision::Denied`].
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn confirm(&self, request: &ApprovalRequest) -> Decision;
}

/// Approves everything. For tests and trusted non-interactive runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn confirm(&self, _request: &ApprovalRequest) -> Decision {
        Decision::Approved
    }
}

/// Denies everything. The safe choice when no human is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDeny;

#[async_trait]
impl ApprovalGate for AutoDeny {
    async fn confirm(&self, _request: &ApprovalRequest) -> Decision {
        Decision::Denied
    }
}

/// Interpret a typed answer. Only `y` / `yes` approve; `None` is returned
/// for input that is neither an answer nor empty, so callers can re-prompt.
pub fn parse_answer(input: &str) -> Option<Decision> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Decision::Approved),
        "" | "n" | "no" => Some(Decision::Denied),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHELL: Danger = Danger {
        action: "Execute Shell Command",
        detail_arg: Some("command"),
    };

    #[test]
    fn detail_uses_named_argument() {
        let req = ApprovalRequest::new("execute_shell_command", &SHELL, &json!({"command": "ls -la"}));
        assert_eq!(req.detail, "ls -la");
        assert_eq!(req.describe(), "Execute Shell Command: ls -la");
    }

    #[test]
    fn detail_falls_back_to_all_arguments() {
        let req = ApprovalRequest::new("execute_shell_command", &SHELL, &json!({"cmd": "ls"}));
        assert_eq!(req.detail, r#"{"cmd":"ls"}"#);
    }

    #[test]
    fn answers() {
        assert_eq!(parse_answer("y"), Some(Decision::Approved));
        assert_eq!(parse_answer(" YES \n"), Some(Decision::Approved));
        assert_eq!(parse_answer(""), Some(Decision::Denied));
        assert_eq!(parse_answer("n"), Some(Decision::Denied));
        assert_eq!(parse_answer("maybe"), None);
    }

    #[tokio::test]
    async fn fixed_policies() {
        let req = ApprovalRequest::new("write_file", &SHELL, &json!({}));
        assert!(AutoApprove.confirm(&req).await.is_approved());
        assert!(!AutoDeny.confirm(&req).await.is_approved());
    }
}
