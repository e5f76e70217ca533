//! `crewloop run`: Drive one goal through the supervisor loop.

use std::sync::Arc;

use crewloop_agent::AgentLoop;
use crewloop_core::agent::AgentMessage;
use crewloop_core::identity::{StaticIdentity, resolve_user_id};
use crewloop_memory::{MemoryRecorder, open_store};
use crewloop_providers::ModelGateway;

use super::{format_record, load_config};

pub async fn run(goal: String, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let goal = goal.trim();
    if goal.is_empty() {
        return Err("Goal must not be empty".into());
    }

    let config = load_config()?;
    let gateway = ModelGateway::from_config(&config)?;
    if !gateway.is_live() {
        eprintln!("  No API key configured: replies are mocked.");
        eprintln!("  Set CREWLOOP_API_KEY or ANTHROPIC_API_KEY to call the model.\n");
    }

    let store = open_store(&config.memory).await?;
    let recorder = MemoryRecorder::new(store);
    let identity = Arc::new(StaticIdentity(config.identity.user_id.clone()));

    let agent = AgentLoop::new(gateway, recorder.clone(), identity.clone())
        .with_max_iterations(config.agent.max_iterations)
        .with_history_window(config.agent.history_window)
        .with_fallback_user_id(&config.identity.fallback_user_id);

    let state = agent.run(goal).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("🎯 Goal: {}", state.goal);
    println!(
        "   {} iteration(s), {} message(s), phase: {}\n",
        state.iteration,
        state.messages.len(),
        state.current_phase
    );
    for message in &state.messages {
        println!("{}", format_message(message));
    }

    let user_id = resolve_user_id(identity.as_ref(), &config.identity.fallback_user_id).await;
    let rows = recorder.fetch(&user_id, config.memory.fetch_limit).await;
    println!("\n🧠 Recent memory ({user_id}, {}):", config.memory.backend);
    if rows.is_empty() {
        println!("   (none)");
    }
    for row in &rows {
        println!("{}", format_record(row));
    }

    Ok(())
}

/// Transcript form of a message: role header, content, optional tool line.
fn format_message(message: &AgentMessage) -> String {
    let mut out = format!("[{}] {}", message.role, message.content);
    if let Some(exec) = &message.tool_execution {
        out.push_str(&format!(
            "\n    ⚙ {} → {} ({:?})",
            exec.tool, exec.output, exec.status
        ));
    }
    out.push('\n');
    out
}
