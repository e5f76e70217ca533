//! Shared test helpers for loop tests.

use crewloop_core::error::ProviderError;
use crewloop_core::provider::{ContentBlock, Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that replays scripted replies in call order.
///
/// Once the script runs out every call gets `fallback`. Every request is
/// kept so tests can inspect prompts and count calls.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<String>>,
    fallback: String,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<&str>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(script.into_iter().map(String::from).collect()),
            fallback: fallback.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with the same text.
    pub fn always(text: &str) -> Self {
        Self::new(Vec::new(), text)
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let text = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(make_text_response(&text))
    }
}

/// A provider that fails every call.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        id: "msg_mock".into(),
        model: "mock-model".into(),
        content: vec![ContentBlock::Text { text: text.into() }],
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}
