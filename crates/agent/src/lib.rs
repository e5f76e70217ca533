//! The supervisor loop for crewloop.
//!
//! Each outer pass runs the same fixed sequence:
//!
//! 1. **Plan**: the supervisor proposes next steps from the goal and recent history
//! 2. **Route**: a second call names the specialist (researcher, coder, tester)
//! 3. **Act**: the specialist responds; a simulated tool trace is attached
//! 4. **Observe**: the supervisor summarizes what was learned
//! 5. **Critique**: the supervisor decides whether the goal is met
//!
//! The loop stops when the critique signals completion or the iteration
//! bound is reached. Every model reply is written to the memory log.

pub mod loop_runner;
pub mod prompts;
pub mod routing;
pub mod simulate;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::{AgentLoop, DEFAULT_HISTORY_WINDOW};
pub use routing::{is_complete, select_role};
pub use simulate::{TOOLS, simulate_tool_execution};
