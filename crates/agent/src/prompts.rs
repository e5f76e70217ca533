//! Prompt text for every model call in a loop pass.

use crewloop_core::agent::{AgentRole, AgentState};

/// Asked after every act step.
pub const OBSERVE_PROMPT: &str = "Review the latest agent output. What did we learn?";

/// The supervisor's system prompt for one goal.
pub fn supervisor(goal: &str) -> String {
    format!(
        "You are a Supervisor AI orchestrating a team of 3 specialized agents:\n\
         - Researcher: Conducts research and gathers information\n\
         - Coder: Writes and executes code\n\
         - Tester: Tests and validates code\n\
         \n\
         Your goal: {goal}\n\
         \n\
         Follow this loop:\n\
         1. PLAN: Analyze the goal and decide which agent should act next\n\
         2. ACT: Delegate to the appropriate agent\n\
         3. OBSERVE: Review the agent's output\n\
         4. CRITIQUE: Evaluate progress and decide next steps\n\
         5. Repeat until the goal is complete\n\
         \n\
         Be concise and action-oriented."
    )
}

/// Plan request. Only the last `window` messages of the run are replayed.
pub fn plan(state: &AgentState, window: usize) -> String {
    let goal = &state.goal;
    if state.messages.is_empty() {
        return format!("Goal: {goal}\n\nCreate an initial plan.");
    }

    let history = state
        .recent(window)
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Goal: {goal}\n\nPrevious messages:\n{history}\n\nWhat should we do next?")
}

pub fn route(plan: &str) -> String {
    format!(
        "Based on this plan: \"{plan}\", which agent should act next? \
         Respond with only: researcher, coder, or tester"
    )
}

/// System prompt for a specialist. The supervisor gets its own via [`supervisor`].
pub fn specialist(role: AgentRole, goal: &str) -> String {
    match role {
        AgentRole::Researcher => format!(
            "You are a Researcher agent. Your task: {goal}\n\n\
             Conduct research, gather information, and provide insights."
        ),
        AgentRole::Coder => format!(
            "You are a Coder agent. Your task: {goal}\n\n\
             Write code, implement solutions, and execute programs."
        ),
        AgentRole::Tester => format!(
            "You are a Tester agent. Your task: {goal}\n\n\
             Test code, validate functionality, and report issues."
        ),
        AgentRole::Supervisor => supervisor(goal),
    }
}

pub fn act(plan: &str) -> String {
    format!("Plan: {plan}\n\nTake action now.")
}

pub fn critique(goal: &str) -> String {
    format!("Goal: {goal}\n\nEvaluate progress. Should we continue or are we done?")
}
