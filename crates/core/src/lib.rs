//! # crewloop core
//!
//! Domain types, collaborator traits, and error definitions for the crewloop
//! supervisor loop. This crate has no I/O of its own: it describes the data
//! that flows through one run and the three seams the controller talks to.
//!
//! ## Seams
//!
//! - [`Provider`]: a hosted text-generation backend
//! - [`MemoryStore`]: the append/read log of memory records
//! - [`IdentityProvider`]: where the acting user's id comes from
//!
//! Implementations live in their respective crates so tests can swap in
//! scripted doubles.

pub mod agent;
pub mod error;
pub mod identity;
pub mod memory;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use agent::{DEFAULT_MAX_ITERATIONS, AgentMessage, AgentRole, AgentState, Phase, ToolExecution, ToolStatus};
pub use error::{Error, MemoryError, ProviderError, Result};
pub use identity::{DEV_USER_ID, IdentityProvider, StaticIdentity, resolve_user_id};
pub use memory::{MemoryRecord, MemoryStore, NewMemoryRecord};
pub use message::{ChatMessage, ChatRole};
pub use provider::{ContentBlock, Provider, ProviderRequest, ProviderResponse, Usage};
