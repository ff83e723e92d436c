//! End-to-end tests for the TagClaw agent.
//!
//! These drive the real tool registry, the file-backed memory store and the
//! dispatch loop with a scripted model standing in for the provider.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tagclaw_agent::{build_system_prompt, AgentLoop, LoopState, TaskMode};
use tagclaw_core::approval::{ApprovalGate, AutoApprove, AutoDeny};
use tagclaw_core::error::ProviderError;
use tagclaw_core::memory::{MemoryStore, RetrieveQuery};
use tagclaw_core::message::{Conversation, Message, MessageToolCall, Role};
use tagclaw_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use tagclaw_memory::FileNodeStore;
use tagclaw_tools::default_registry;

// ── Scripted model ───────────────────────────────────────────────────────

/// One scripted model turn. Sees the history so far, so later steps can
/// refer to ids produced by earlier tool results.
type Step = Box<dyn Fn(&[Message]) -> ProviderResponse + Send + Sync>;

struct ScriptedProvider {
    steps: Mutex<Vec<Step>>,
}

impl ScriptedProvider {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut steps = self.steps.lock().unwrap();
        if steps.is_empty() {
            return Err(ProviderError::Network("script exhausted".into()));
        }
        let step = steps.remove(0);
        Ok(step(&request.messages))
    }
}

fn response(message: Message) -> ProviderResponse {
    ProviderResponse {
        message,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock".into(),
    }
}

fn say(text: &'static str) -> Step {
    Box::new(move |_| response(Message::assistant(text)))
}

fn call(id: &'static str, name: &'static str, args: Value) -> Step {
    Box::new(move |_| {
        response(Message::assistant_tool_calls(
            "",
            vec![MessageToolCall {
                id: id.into(),
                name: name.into(),
                arguments: args.to_string(),
            }],
        ))
    })
}

/// A call whose arguments are built from the most recent tool result.
fn call_with(
    id: &'static str,
    name: &'static str,
    build: impl Fn(&Value) -> Value + Send + Sync + 'static,
) -> Step {
    Box::new(move |history| {
        let previous = last_tool_payload(history);
        response(Message::assistant_tool_calls(
            "",
            vec![MessageToolCall {
                id: id.into(),
                name: name.into(),
                arguments: build(&previous).to_string(),
            }],
        ))
    })
}

fn last_tool_payload(history: &[Message]) -> Value {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::Tool)
        .and_then(|m| serde_json::from_str(&m.content).ok())
        .unwrap_or(Value::Null)
}

fn tool_payloads(conv: &Conversation) -> Vec<Value> {
    conv.messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| serde_json::from_str(&m.content).unwrap())
        .collect()
}

fn agent_with(
    steps: Vec<Step>,
    store: Option<Arc<FileNodeStore>>,
    gate: Arc<dyn ApprovalGate>,
) -> AgentLoop {
    let memory = store.map(|s| s as Arc<dyn MemoryStore>);
    let memory_enabled = memory.is_some();
    let tools = Arc::new(default_registry(memory));
    let prompt = build_system_prompt(TaskMode::SinglePass, &tools.names(), memory_enabled);
    AgentLoop::new(
        Arc::new(ScriptedProvider::new(steps)),
        "mock",
        0.6,
        0.9,
        tools,
        gate,
    )
    .with_system_prompt(prompt)
}

// ── Memory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_aquila_memory_lifecycle_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent_memory.json");
    let store = Arc::new(FileNodeStore::open(&path).unwrap());

    let agent = agent_with(
        vec![
            call(
                "call_create",
                "create_memory_node",
                json!({
                    "tags": ["project:Aquila", "deadline"],
                    "content": "Aquila ships on Friday",
                    "source_chat": "standup"
                }),
            ),
            call(
                "call_find",
                "retrieve_memory_nodes",
                json!({ "match_all_tags": ["project:Aquila", "deadline"] }),
            ),
            call_with("call_update", "update_memory_node", |found| {
                json!({
                    "node_id": found["nodes"][0]["node_id"],
                    "add_tags": ["done"],
                    "remove_tags": ["deadline"]
                })
            }),
            say("Noted, Aquila is done."),
        ],
        Some(store.clone()),
        Arc::new(AutoDeny),
    );

    let mut conv = Conversation::new();
    conv.push(Message::user("Remember Aquila ships Friday, then mark it done"));
    let answer = agent.process(&mut conv).await.unwrap();
    assert_eq!(answer, "Noted, Aquila is done.");

    let payloads = tool_payloads(&conv);
    assert_eq!(payloads[0]["status"], "created");
    assert_eq!(payloads[1]["count"], 1);
    assert_eq!(payloads[2]["status"], "updated");
    assert_eq!(payloads[2]["node"]["tags"], json!(["project:Aquila", "done"]));

    // Memory tools are not dangerous, so a deny-everything gate never blocked them.
    assert!(payloads.iter().all(|p| p.get("skipped").is_none()));

    drop(agent);
    drop(store);

    let reopened = FileNodeStore::open(&path).unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);
    let done = reopened
        .retrieve(RetrieveQuery {
            match_all_tags: vec!["project:Aquila".into(), "done".into()],
            query_in_content: None,
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].content, "Aquila ships on Friday");
    assert_eq!(done[0].source_chat.as_deref(), Some("standup"));
    assert!(done[0].updated_at > done[0].created_at);
}

#[tokio::test]
async fn e2e_delete_twice_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileNodeStore::open(dir.path().join("mem.json")).unwrap());

    let agent = agent_with(
        vec![
            call(
                "call_create",
                "create_memory_node",
                json!({ "tags": ["scratch"], "content": "temporary" }),
            ),
            call_with("call_delete_1", "delete_memory_node", |created| {
                json!({ "node_id": created["node_id"] })
            }),
            call_with("call_delete_2", "delete_memory_node", |deleted| {
                json!({ "node_id": deleted["node_id"] })
            }),
            say("Cleaned up."),
        ],
        Some(store.clone()),
        Arc::new(AutoDeny),
    );

    let mut conv = Conversation::new();
    conv.push(Message::user("store then forget"));
    agent.process(&mut conv).await.unwrap();

    let payloads = tool_payloads(&conv);
    assert_eq!(payloads[1]["status"], "deleted");
    assert_eq!(payloads[1]["details"]["content_preview"], "temporary");
    assert_eq!(payloads[2]["kind"], "not_found");
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn e2e_memory_tools_absent_without_store() {
    let agent = agent_with(
        vec![
            call(
                "call_mem",
                "create_memory_node",
                json!({ "tags": ["a"], "content": "b" }),
            ),
            say("Memory is off."),
        ],
        None,
        Arc::new(AutoApprove),
    );

    assert!(!agent.tools().contains("create_memory_node"));
    let mut conv = Conversation::new();
    conv.push(Message::user("remember this"));
    agent.process(&mut conv).await.unwrap();
    assert_eq!(tool_payloads(&conv)[0]["kind"], "unknown_tool");
}

// ── Approval ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_denied_write_leaves_disk_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.txt");

    let agent = agent_with(
        vec![
            call(
                "call_write",
                "write_file",
                json!({ "path": target.to_str().unwrap(), "content": "hello" }),
            ),
            say("Understood, nothing written."),
        ],
        None,
        Arc::new(AutoDeny),
    );

    let mut conv = Conversation::new();
    conv.push(Message::user("write hello"));
    let answer = agent.process(&mut conv).await.unwrap();

    assert_eq!(answer, "Understood, nothing written.");
    assert!(!target.exists());
    assert_eq!(
        tool_payloads(&conv)[0],
        json!({ "error": "Action denied by user.", "skipped": true })
    );
}

#[tokio::test]
async fn e2e_approved_write_then_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.txt");
    let target_str = target.to_str().unwrap().to_string();

    let agent = agent_with(
        vec![
            call(
                "call_write",
                "write_file",
                json!({ "path": target_str.clone(), "content": "hello" }),
            ),
            call("call_read", "read_file", json!({ "path": target_str })),
            say("The file says hello."),
        ],
        None,
        Arc::new(AutoApprove),
    );

    let mut conv = Conversation::new();
    conv.push(Message::user("write hello and check it"));
    agent.process(&mut conv).await.unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
    let payloads = tool_payloads(&conv);
    assert_eq!(payloads[0]["bytes_written"], 5);
    assert_eq!(payloads[1]["content"], "hello");
    assert_eq!(agent.state(), LoopState::Done);
}

// ── Dispatch ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_unknown_tool_does_not_end_session() {
    let agent = agent_with(
        vec![
            call("call_frob", "frobnicate", json!({ "level": 11 })),
            say("I don't have that tool."),
            say("Second turn works."),
        ],
        None,
        Arc::new(AutoApprove),
    );

    let mut conv = Conversation::new();
    conv.push(Message::user("frobnicate"));
    assert_eq!(agent.process(&mut conv).await.unwrap(), "I don't have that tool.");
    assert_eq!(tool_payloads(&conv)[0]["kind"], "unknown_tool");

    conv.push(Message::user("anything else?"));
    assert_eq!(agent.process(&mut conv).await.unwrap(), "Second turn works.");
}

#[tokio::test]
async fn e2e_provider_failure_is_retryable() {
    // The script is empty after one step, so the second call fails.
    let agent = agent_with(vec![say("first")], None, Arc::new(AutoApprove));

    let mut conv = Conversation::new();
    conv.push(Message::user("one"));
    agent.process(&mut conv).await.unwrap();
    let before = conv.len();

    conv.push(Message::user("two"));
    let err = agent.process(&mut conv).await.unwrap_err();
    assert!(err.to_string().contains("script exhausted"));
    assert_eq!(conv.len(), before + 1);
    assert_eq!(conv.last().unwrap().content, "two");
}

#[tokio::test]
async fn e2e_system_prompt_lists_tools_and_memory() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileNodeStore::open(dir.path().join("m.json")).unwrap());
    let agent = agent_with(vec![say("ok")], Some(store), Arc::new(AutoApprove));

    let mut conv = Conversation::new();
    conv.push(Message::user("hi"));
    agent.process(&mut conv).await.unwrap();

    let system = &conv.messages[0];
    assert_eq!(system.role, Role::System);
    assert!(system.content.contains("execute_shell_command"));
    assert!(system.content.contains("create_memory_node"));
    assert_eq!(agent.tools().len(), 14);
}
