//! Model gateway: the single place the loop asks a model for text.
//!
//! The gateway never fails. Whatever happens (no credential, a provider
//! error, a reply without text) the caller gets a string back:
//!
//! | situation            | returned text                     |
//! |----------------------|-----------------------------------|
//! | no provider          | `Mock response: <last content>`   |
//! | success              | first text block                  |
//! | no text block        | `No text content in response`     |
//! | provider error       | `Error: <message>`                |

use std::sync::Arc;
use std::time::Duration;

use crewloop_config::AppConfig;
use crewloop_core::error::ProviderError;
use crewloop_core::message::ChatMessage;
use crewloop_core::provider::{Provider, ProviderRequest};
use tracing::{debug, warn};

use crate::anthropic::AnthropicProvider;

/// Returned when the model replied without any text block.
pub const NO_TEXT_CONTENT: &str = "No text content in response";

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Wraps an optional provider with the fixed model settings for a run.
#[derive(Clone)]
pub struct ModelGateway {
    provider: Option<Arc<dyn Provider>>,
    model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider: Some(provider),
            model: model.into(),
            max_tokens,
        }
    }

    /// A gateway with no credential: every call answers with a mock echo.
    pub fn unconfigured() -> Self {
        Self {
            provider: None,
            model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Build from configuration. No API key means mock mode.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            debug!("No API key configured, gateway runs in mock mode");
            return Ok(Self {
                provider: None,
                model: config.model.clone(),
                max_tokens: config.max_tokens,
            });
        };

        let mut provider = match config.request_timeout_secs {
            Some(secs) => AnthropicProvider::with_timeout(key, Duration::from_secs(secs))?,
            None => AnthropicProvider::new(key)?,
        };
        if let Some(url) = &config.api_url {
            provider = provider.with_base_url(url);
        }

        Ok(Self::new(Arc::new(provider), &config.model, config.max_tokens))
    }

    /// Whether calls reach a real provider.
    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for text. Never fails; see the module docs for the
    /// strings returned in each situation.
    pub async fn generate(&self, messages: &[ChatMessage], system: Option<&str>) -> String {
        let Some(provider) = &self.provider else {
            let last = messages
                .last()
                .map(|m| m.content.as_str())
                .filter(|c| !c.is_empty())
                .unwrap_or("No message");
            debug!("No provider configured, returning mock response");
            return format!("Mock response: {last}");
        };

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            system: system.map(String::from),
            max_tokens: self.max_tokens,
        };

        debug!(
            provider = provider.name(),
            model = %self.model,
            messages = messages.len(),
            "Calling model"
        );
        match provider.complete(request).await {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    debug!(
                        provider = provider.name(),
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "Model call finished"
                    );
                }
                match response.first_text() {
                    Some(text) => text.to_string(),
                    None => NO_TEXT_CONTENT.to_string(),
                }
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "Model call failed");
                format!("Error: {e}")
            }
        }
    }
}
