//! End-to-end integration tests for crewloop.
//!
//! These drive the full loop (gateway, controller, recorder, SQLite store)
//! with a scripted provider standing in for the hosted model.

use std::sync::{Arc, Mutex};

use crewloop_agent::AgentLoop;
use crewloop_config::{AppConfig, MemoryBackendKind, MemoryConfig};
use crewloop_core::agent::{AgentRole, Phase};
use crewloop_core::error::ProviderError;
use crewloop_core::identity::StaticIdentity;
use crewloop_core::provider::{ContentBlock, Provider, ProviderRequest, ProviderResponse, Usage};
use crewloop_memory::{MemoryRecorder, SqliteStore, open_store};
use crewloop_providers::{ModelGateway, NO_TEXT_CONTENT};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Returns scripted replies in sequence, then `fallback` forever.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    fallback: ProviderResponse,
    call_count: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(replies: &[&str], fallback: &str) -> Self {
        Self {
            responses: Mutex::new(replies.iter().map(|r| text_response(r)).collect()),
            fallback: text_response(fallback),
            call_count: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let resp = responses
            .get(*count)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());
        *count += 1;
        Ok(resp)
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        id: "msg_e2e".into(),
        model: "claude-3-5-sonnet-20241022".into(),
        content: vec![ContentBlock::Text { text: text.into() }],
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}

async fn sqlite_recorder() -> MemoryRecorder {
    let store = SqliteStore::new("sqlite::memory:").await.unwrap();
    MemoryRecorder::new(Arc::new(store))
}

fn agent(provider: Arc<ScriptedProvider>, recorder: MemoryRecorder, user: Option<&str>) -> AgentLoop {
    AgentLoop::new(
        ModelGateway::new(provider, "claude-3-5-sonnet-20241022", 4096),
        recorder,
        Arc::new(StaticIdentity(user.map(String::from))),
    )
    .with_tool_seed(11)
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[tokio::test]
async fn haiku_completes_in_one_iteration() {
    let provider = Arc::new(ScriptedProvider::new(
        &[
            "1. Research haiku form. 2. Draft.",
            "researcher",
            "A haiku has 5-7-5 syllables.",
            "We know the structure now.",
            "Task complete.",
        ],
        "unexpected call",
    ));
    let recorder = sqlite_recorder().await;
    let agent = agent(provider.clone(), recorder.clone(), Some("poet"));

    let state = agent.run("write a haiku").await;

    assert_eq!(state.iteration, 1);
    assert_eq!(state.messages.len(), 4);
    assert_eq!(state.current_phase, Phase::Complete);
    assert_eq!(provider.calls(), 5);
    assert_eq!(state.messages[1].role, AgentRole::Researcher);

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["currentPhase"], "complete");
    assert_eq!(json["messages"].as_array().unwrap().len(), 4);
    assert_eq!(json["messages"][1]["toolExecution"]["status"], "success");
}

#[tokio::test]
async fn ten_iterations_without_completion() {
    let provider = Arc::new(ScriptedProvider::new(&[], "Keep going with the next step."));
    let recorder = sqlite_recorder().await;
    let agent = agent(provider.clone(), recorder.clone(), Some("builder"));

    let state = agent.run("build a web scraper").await;

    assert_eq!(state.iteration, 10);
    assert_eq!(state.messages.len(), 40);
    assert_eq!(state.current_phase, Phase::Complete);
    assert_eq!(provider.calls(), 50);

    // Routing fell through to the coder every time.
    let acting: Vec<_> = state.messages.iter().skip(1).step_by(4).collect();
    assert_eq!(acting.len(), 10);
    assert!(acting.iter().all(|m| m.role == AgentRole::Coder && m.tool_execution.is_some()));

    // Five rows per pass; fetch is capped and newest first.
    assert_eq!(recorder.store().count("builder").await.unwrap(), 50);
    let rows = recorder.fetch("builder", 20).await;
    assert_eq!(rows.len(), 20);
    assert!(rows.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn persisted_rows_round_trip() {
    let provider = Arc::new(ScriptedProvider::new(
        &["plan it", "tester", "all 12 tests pass", "looks good", "We are done."],
        "unexpected call",
    ));
    let recorder = sqlite_recorder().await;
    let agent = agent(provider, recorder.clone(), None);

    agent.run("validate the parser").await;

    // Anonymous runs are stored under the dev fallback identity.
    let rows = recorder.fetch("dev-user-id", 20).await;
    assert_eq!(rows.len(), 5);

    let newest = &rows[0];
    assert_eq!(newest.agent_role, AgentRole::Supervisor);
    assert_eq!(newest.content, "We are done.");

    let act = rows
        .iter()
        .find(|r| r.agent_role == AgentRole::Tester)
        .unwrap();
    assert_eq!(act.content, "all 12 tests pass");
    let meta = act.metadata_json().unwrap();
    let tool = meta["tool"].as_str().unwrap();
    assert_eq!(meta["input"], format!("Execute {tool} for: validate the parser"));
    assert_eq!(meta["output"], format!("Tool {tool} completed successfully"));

    assert!(recorder.fetch("someone-else", 20).await.is_empty());
}

#[tokio::test]
async fn non_text_reply_becomes_sentinel() {
    struct ToolOnlyProvider;

    #[async_trait::async_trait]
    impl Provider for ToolOnlyProvider {
        fn name(&self) -> &str {
            "tool_only"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                id: "msg".into(),
                model: "m".into(),
                content: vec![ContentBlock::Other {
                    kind: "tool_use".into(),
                }],
                usage: None,
            })
        }
    }

    let agent = AgentLoop::new(
        ModelGateway::new(Arc::new(ToolOnlyProvider), "m", 4096),
        MemoryRecorder::disabled(),
        Arc::new(StaticIdentity::anonymous()),
    )
    .with_max_iterations(1);

    let state = agent.run("g").await;
    assert_eq!(state.messages.len(), 4);
    assert!(state.messages.iter().all(|m| m.content == NO_TEXT_CONTENT));
    assert_eq!(state.current_phase, Phase::Complete);
}

#[tokio::test]
async fn configured_sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let memory = MemoryConfig {
        backend: MemoryBackendKind::Sqlite,
        path: dir.path().join("memory.sqlite"),
        ..MemoryConfig::default()
    };

    {
        let recorder = MemoryRecorder::new(open_store(&memory).await.unwrap());
        let provider = Arc::new(ScriptedProvider::new(&[], "done"));
        agent(provider, recorder, Some("u1")).run("g").await;
    }

    let recorder = MemoryRecorder::new(open_store(&memory).await.unwrap());
    assert_eq!(recorder.fetch("u1", 20).await.len(), 5);
}

#[tokio::test]
async fn mock_mode_from_default_config() {
    let config = AppConfig::default();
    let gateway = ModelGateway::from_config(&config).unwrap();
    assert!(!gateway.is_live());

    let agent = AgentLoop::new(
        gateway,
        MemoryRecorder::disabled(),
        Arc::new(StaticIdentity::anonymous()),
    );
    let state = agent.run("write a haiku").await;

    assert!(state.messages.iter().all(|m| m.content.starts_with("Mock response: ")));
    assert_eq!(state.current_phase, Phase::Complete);
}
