//! Language-model access for crewloop.
//!
//! [`AnthropicProvider`] implements `crewloop_core::Provider` against the
//! Anthropic Messages API. [`ModelGateway`] wraps an optional provider and
//! never fails: it always hands the caller text (real, mock, or `Error: ...`).

pub mod anthropic;
pub mod gateway;

pub use anthropic::AnthropicProvider;
pub use gateway::{ModelGateway, NO_TEXT_CONTENT};
