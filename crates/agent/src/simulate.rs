//! Simulated tool traces for the act step. Nothing is executed.

use crewloop_core::agent::{ToolExecution, ToolStatus};
use rand::Rng;

/// Tools a specialist can appear to use.
pub const TOOLS: [&str; 3] = ["web_search", "browse_page", "code_execution"];

/// Pick one of [`TOOLS`] uniformly and describe a successful run of it.
pub fn simulate_tool_execution<R: Rng>(rng: &mut R, goal: &str) -> ToolExecution {
    let tool = TOOLS[rng.random_range(0..TOOLS.len())];
    ToolExecution {
        tool: tool.to_string(),
        input: format!("Execute {tool} for: {goal}"),
        output: format!("Tool {tool} completed successfully"),
        status: ToolStatus::Success,
    }
}

/// The metadata persisted alongside an act reply.
pub fn tool_metadata(execution: &ToolExecution) -> serde_json::Value {
    serde_json::json!({
        "tool": execution.tool,
        "input": execution.input,
        "output": execution.output,
    })
}
