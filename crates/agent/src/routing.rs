//! Reply interpretation: who acts next, and whether the goal is met.
//!
//! Both checks are plain case-insensitive substring tests on the model's
//! reply. Nothing else feeds into either decision.

use crewloop_core::agent::AgentRole;

const COMPLETION_WORDS: [&str; 3] = ["complete", "done", "finished"];

/// Pick the specialist named in a routing reply.
///
/// `researcher` wins over `tester`; anything else goes to the coder.
pub fn select_role(reply: &str) -> AgentRole {
    let reply = reply.to_lowercase();
    if reply.contains("researcher") {
        AgentRole::Researcher
    } else if reply.contains("tester") {
        AgentRole::Tester
    } else {
        AgentRole::Coder
    }
}

/// Whether a critique reply signals the goal is met.
pub fn is_complete(reply: &str) -> bool {
    let reply = reply.to_lowercase();
    COMPLETION_WORDS.iter().any(|w| reply.contains(w))
}
