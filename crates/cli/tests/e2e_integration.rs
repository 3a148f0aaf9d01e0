//! End-to-end integration tests for the Quorum runtime.
//!
//! These tests exercise the full pipeline from a config file to an agent
//! response: config loading, retrieval seeding, registry assembly,
//! delegation, sandbox execution and progress streaming.

use std::io::Write;
use std::sync::{Arc, Mutex};

use quorum_agent::{build_registry, AgentDeps};
use quorum_config::AppConfig;
use quorum_core::agent::Invocation;
use quorum_core::error::{ProviderError, ToolError};
use quorum_core::message::{Message, ToolCall};
use quorum_core::progress::{ChannelSink, ProgressEvent};
use quorum_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolChoice, Usage};
use quorum_core::sandbox::{CodeExecutor, ExecutionOutput};
use quorum_retrieval::ContextRetriever;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let n = requests.len();
        if n >= responses.len() {
            panic!("ScriptedProvider exhausted: call #{n}, have {}", responses.len());
        }
        requests.push(request);
        Ok(responses[n].clone())
    }
}

/// Keeps asking for the same tool forever.
struct LoopingProvider {
    calls: Mutex<usize>,
}

#[async_trait::async_trait]
impl Provider for LoopingProvider {
    fn name(&self) -> &str {
        "looping"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        Ok(tool_response(vec![ToolCall::new("call_sql", "explain_sql", "{}")]))
    }
}

struct FixedSandbox(ExecutionOutput);

#[async_trait::async_trait]
impl CodeExecutor for FixedSandbox {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn run(&self, _code: &str, _language: &str) -> Result<ExecutionOutput, ToolError> {
        Ok(self.0.clone())
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "mock".into(),
    }
}

fn tool_response(calls: Vec<ToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_tool_calls(calls),
        usage: usage(),
        model: "mock".into(),
    }
}

fn route(agent: &str, query: &str) -> ToolCall {
    ToolCall::new(
        "call_route",
        "route_to_agent",
        serde_json::json!({"agent_name": agent, "query": query}).to_string(),
    )
}

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

// ── E2E: Config-driven pipeline ──────────────────────────────────────────

#[tokio::test]
async fn e2e_config_file_sets_loop_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "config.toml",
        r#"
default_model = "gpt-4o-mini"

[agent]
max_steps = 2
max_retries = 1
"#,
    );
    let config = AppConfig::load_from(&path).unwrap();

    let provider = Arc::new(LoopingProvider { calls: Mutex::new(0) });
    let deps = AgentDeps::new(
        provider.clone(),
        &config.default_model,
        Arc::new(ContextRetriever::new()),
    );
    let registry = build_registry(&deps, &config.agent);

    let sql = registry.lookup("sql").unwrap();
    let resp = sql.execute("explain my query", Invocation::new(&registry)).await;

    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Max steps or retries exceeded"));
    assert_eq!(*provider.calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn e2e_seed_file_feeds_the_researcher() {
    let dir = tempfile::tempdir().unwrap();
    let seed = write_file(
        &dir,
        "seed.json",
        r#"{
            "documents": [
                {"title": "acme_orders.csv", "file_id": "f1", "source": "uploads/acme_orders.csv", "content": "row data"},
                {"title": "acme_2019_report.pdf", "file_id": "old", "source": "archive/acme_2019_report.pdf"}
            ],
            "graph": [{"name": "Acme", "label": "Company"}],
            "session_files": [{"id": "f1", "filename": "acme_orders.csv"}]
        }"#,
    );
    let config_path = write_file(
        &dir,
        "config.toml",
        &format!("[retrieval]\nseed_file = {:?}\n", seed.display().to_string()),
    );
    let config = AppConfig::load_from(&config_path).unwrap();
    let retriever = Arc::new(quorum_retrieval::build_from_config(&config.retrieval).unwrap());

    let provider = Arc::new(ScriptedProvider::new(vec![text_response(
        "You have acme_orders.csv in this session.",
    )]));
    let deps = AgentDeps::new(provider.clone(), "mock", retriever);
    let registry = build_registry(&deps, &config.agent);

    let researcher = registry.lookup("researcher").unwrap();
    let resp = researcher
        .execute("what acme data do we have?", Invocation::new(&registry))
        .await;

    assert!(resp.success);
    assert_eq!(resp.agent_name, "Market Researcher");
    assert_eq!(
        resp.sources,
        ["In-Memory Documents", "In-Memory Graph", "acme_orders.csv", "acme_2019_report.pdf"]
    );

    let system = provider.requests()[0].messages[0].text().to_string();
    assert!(system.contains("[Session] acme_orders.csv (Status: indexed)"));
    assert!(system.contains("[Database] acme_2019_report.pdf"));
    assert!(system.contains("[Graph] Company: Acme"));
    assert!(!system.contains("row data"));
}

#[tokio::test]
async fn e2e_session_question_hides_historical_files() {
    let dir = tempfile::tempdir().unwrap();
    let seed = write_file(
        &dir,
        "seed.json",
        r#"{
            "documents": [
                {"title": "acme_orders.csv", "file_id": "f1", "source": "uploads/acme_orders.csv"},
                {"title": "acme_2019_report.pdf", "file_id": "old", "source": "archive/acme_2019_report.pdf"}
            ],
            "session_files": [{"id": "f1", "filename": "acme_orders.csv"}]
        }"#,
    );
    let mut config = AppConfig::default();
    config.retrieval.seed_file = Some(seed.display().to_string());
    let retriever = Arc::new(quorum_retrieval::build_from_config(&config.retrieval).unwrap());

    let provider = Arc::new(ScriptedProvider::new(vec![text_response("Only acme_orders.csv.")]));
    let deps = AgentDeps::new(provider.clone(), "mock", retriever);
    let registry = build_registry(&deps, &config.agent);

    registry
        .lookup("researcher")
        .unwrap()
        .execute(
            "which acme files are uploaded in the current session?",
            Invocation::new(&registry),
        )
        .await;

    let system = provider.requests()[0].messages[0].text().to_string();
    assert!(system.contains("[Session] acme_orders.csv"));
    assert!(!system.contains("acme_2019_report.pdf"));
    assert!(system.contains("[Historical files hidden"));
}

#[tokio::test]
async fn e2e_progress_streams_through_a_channel() {
    // The orchestrator labels the task while routing.
    let mut first = tool_response(vec![route("python", "EXECUTE: sum 1..10")]);
    first.message.content = Some("[Task: Sum]".into());
    let provider = Arc::new(ScriptedProvider::new(vec![
        first,
        tool_response(vec![ToolCall::new(
            "call_code",
            "execute_code",
            r#"{"code":"print(sum(range(11)))"}"#,
        )]),
        text_response("The sum is 55."),
    ]));
    let deps = AgentDeps::new(provider, "mock", Arc::new(ContextRetriever::new()))
        .with_sandbox(Arc::new(FixedSandbox(ExecutionOutput::success("55"))));
    let registry = build_registry(&deps, &Default::default());

    let (tx, mut rx) = tokio::sync::mpsc::channel(32);
    let sink = ChannelSink::new(tx);
    let resp = registry
        .lookup("orchestrator")
        .unwrap()
        .execute("add up 1 to 10", Invocation::new(&registry).with_progress(&sink))
        .await;
    drop(sink);

    assert!(resp.success);
    assert_eq!(resp.content, "The sum is 55.");

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events[1], ProgressEvent::QuerySummary("Sum".into()));
    assert!(events.contains(&ProgressEvent::CodeExecution("print(sum(range(11)))".into())));
    assert!(events.contains(&ProgressEvent::Observation("55".into())));
}

#[tokio::test]
async fn e2e_schema_and_history_reach_the_sql_prompt() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_response(
        "SELECT customer_id, SUM(total) FROM orders GROUP BY customer_id;",
    )]));
    let deps = AgentDeps::new(provider.clone(), "mock", Arc::new(ContextRetriever::new()));
    let registry = build_registry(&deps, &Default::default());

    let mut context = serde_json::Map::new();
    context.insert("schema".into(), serde_json::json!("orders(id, customer_id, total)"));
    context.insert("conversation_history".into(), serde_json::json!("User: hi\nAssistant: hello"));

    let resp = registry
        .lookup("sql")
        .unwrap()
        .execute("revenue per customer", Invocation::new(&registry).with_context(&context))
        .await;

    assert!(resp.success);
    let request = &provider.requests()[0];
    let system = request.messages[0].text();
    assert!(system.contains("Database Schema:\norders(id, customer_id, total)"));
    assert!(system.contains("Conversation History:\nUser: hi\nAssistant: hello"));
    assert_eq!(request.tool_choice, ToolChoice::Auto);
}

#[tokio::test]
async fn e2e_orchestrator_text_only_route() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![route("python", "TEXT ONLY: write a fibonacci function")]),
        text_response("```python\ndef fib(n):\n    return n if n < 2 else fib(n - 1) + fib(n - 2)\n```"),
    ]));
    let deps = AgentDeps::new(provider.clone(), "mock", Arc::new(ContextRetriever::new()));
    let registry = build_registry(&deps, &Default::default());

    let resp = registry
        .lookup("orchestrator")
        .unwrap()
        .execute("show me a fibonacci function", Invocation::new(&registry))
        .await;

    assert!(resp.success);
    assert_eq!(resp.agent_name, "Python Agent");
    let python_turn = &provider.requests()[1];
    assert_eq!(python_turn.tool_choice, ToolChoice::None);
    assert!(python_turn.tools.is_empty());
}
