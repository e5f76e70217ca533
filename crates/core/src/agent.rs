//! Run state for one supervisor loop.
//!
//! An [`AgentState`] is owned by exactly one run. Messages are appended in
//! chronological order and never reordered or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default upper bound on outer loop passes.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// The logical actor attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Plans, observes, and critiques
    Supervisor,
    /// Gathers information
    Researcher,
    /// Writes code
    Coder,
    /// Validates code
    Tester,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::Researcher => "researcher",
            Self::Coder => "coder",
            Self::Tester => "tester",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supervisor" => Ok(Self::Supervisor),
            "researcher" => Ok(Self::Researcher),
            "coder" => Ok(Self::Coder),
            "tester" => Ok(Self::Tester),
            other => Err(format!("unknown agent role: {other}")),
        }
    }
}

/// The step of the loop cycle a run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Planning,
    Acting,
    Observing,
    Critiquing,
    /// Terminal.
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Planning => "planning",
            Self::Acting => "acting",
            Self::Observing => "observing",
            Self::Critiquing => "critiquing",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Outcome of a simulated tool execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
    Pending,
}

/// A synthetic record of an external action taken during the act phase.
///
/// Nothing is actually executed; this exists so the history shows what a
/// specialist "did".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolExecution {
    pub tool: String,
    pub input: String,
    pub output: String,
    pub status: ToolStatus,
}

/// One emitted step of a run. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    /// Unique message ID
    pub id: String,

    /// Which actor produced this
    pub role: AgentRole,

    /// Model output, verbatim
    pub content: String,

    /// Creation time
    pub timestamp: DateTime<Utc>,

    /// Simulated tool trace (act phase only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_execution: Option<ToolExecution>,
}

impl AgentMessage {
    /// Create a message stamped with a fresh id and the current time.
    pub fn new(role: AgentRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            tool_execution: None,
        }
    }

    /// Attach a simulated tool trace.
    pub fn with_tool_execution(mut self, execution: ToolExecution) -> Self {
        self.tool_execution = Some(execution);
        self
    }
}

/// The mutable control block of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    /// The user-supplied objective
    pub goal: String,

    /// Append-only, chronological
    pub messages: Vec<AgentMessage>,

    /// Where the cycle currently is
    pub current_phase: Phase,

    /// Completed outer passes
    pub iteration: u32,

    /// Hard bound on `iteration`
    pub max_iterations: u32,
}

impl AgentState {
    /// Fresh state in the `planning` phase.
    pub fn new(goal: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            goal: goal.into(),
            messages: Vec::new(),
            current_phase: Phase::Planning,
            iteration: 0,
            max_iterations,
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: AgentMessage) {
        self.messages.push(message);
    }

    /// The most recent `n` messages, oldest first.
    pub fn recent(&self, n: usize) -> &[AgentMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn is_complete(&self) -> bool {
        self.current_phase == Phase::Complete
    }

    /// Whether another outer pass may start.
    pub fn should_continue(&self) -> bool {
        self.iteration < self.max_iterations && !self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_planning() {
        let state = AgentState::new("write a haiku", DEFAULT_MAX_ITERATIONS);
        assert_eq!(state.current_phase, Phase::Planning);
        assert_eq!(state.iteration, 0);
        assert_eq!(state.max_iterations, 10);
        assert!(state.messages.is_empty());
        assert!(state.should_continue());
    }

    #[test]
    fn complete_state_stops() {
        let mut state = AgentState::new("goal", 10);
        state.current_phase = Phase::Complete;
        assert!(!state.should_continue());
    }

    #[test]
    fn bound_reached_stops() {
        let mut state = AgentState::new("goal", 2);
        state.iteration = 2;
        assert!(!state.should_continue());
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut state = AgentState::new("goal", 10);
        for i in 0..7 {
            state.push(AgentMessage::new(AgentRole::Supervisor, format!("m{i}")));
        }
        let tail: Vec<&str> = state.recent(5).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["m2", "m3", "m4", "m5", "m6"]);
        assert_eq!(state.recent(50).len(), 7);
    }

    #[test]
    fn state_serializes_with_camel_case() {
        let mut state = AgentState::new("goal", 10);
        state.push(
            AgentMessage::new(AgentRole::Coder, "fn main() {}").with_tool_execution(ToolExecution {
                tool: "code_execution".into(),
                input: "Execute code_execution for: goal".into(),
                output: "Tool code_execution completed successfully".into(),
                status: ToolStatus::Success,
            }),
        );
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentPhase"], "planning");
        assert_eq!(json["maxIterations"], 10);
        assert_eq!(json["messages"][0]["role"], "coder");
        assert_eq!(json["messages"][0]["toolExecution"]["status"], "success");
    }

    #[test]
    fn role_parses_from_db_string() {
        assert_eq!("tester".parse::<AgentRole>().unwrap(), AgentRole::Tester);
        assert!("manager".parse::<AgentRole>().is_err());
        assert_eq!(AgentRole::Researcher.to_string(), "researcher");
    }
}
