//! Provider construction and the in-process mock used by tests and dry runs.

use crate::llm::{
    CompletionRequest, CompletionResponse, ConfigError, LLMConfig, LLMError, LLMProvider,
    ModelInfo, Provider,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Handler = dyn Fn(&CompletionRequest, usize) -> Result<String, LLMError> + Send + Sync;

/// Mock provider for testing
///
/// Answers come from a handler that sees the request and the zero-based call
/// index. Every request is recorded as a `role: content` transcript so tests
/// can inspect exactly what was sent.
pub struct MockProvider {
    handler: Box<Handler>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Cycle through `responses` in call order.
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_handler(move |_, idx| {
            Ok(responses
                .get(idx % responses.len().max(1))
                .cloned()
                .unwrap_or_else(|| "Mock response".to_string()))
        })
    }

    pub fn always(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&CompletionRequest, usize) -> Result<String, LLMError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Every call fails with `error`.
    pub fn failing(error: LLMError) -> Self {
        Self::with_handler(move |_, _| Err(error.clone()))
    }

    /// Sleep before answering, to exercise timeouts and deadlines.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Transcript of every request received, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        let transcript = request
            .messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        self.prompts.lock().push(transcript);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.handler)(&request, idx).map(|content| CompletionResponse::text(content, "mock"))
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: "mock".to_string(),
            max_tokens: 100_000,
            supports_json_mode: true,
        }
    }
}

/// Select provider based on configuration
///
/// `provider_type` is `mock`, `auto` (first configured in the environment) or a
/// provider name. Options: `response` for the mock's canned answer.
pub fn create_provider(
    provider_type: &str,
    options: &HashMap<String, String>,
) -> Result<Arc<dyn LLMProvider>, ConfigError> {
    match provider_type.trim().to_ascii_lowercase().as_str() {
        "mock" => {
            let response = options.get("response").map(|s| s.as_str()).unwrap_or("{}");
            Ok(Arc::new(MockProvider::always(response)))
        }
        "auto" => remote_provider(LLMConfig::from_env()?),
        other => {
            let provider = Provider::parse(other)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown provider: {other}")))?;
            let config =
                LLMConfig::from_env_for(provider).ok_or(ConfigError::NoProviderConfigured)?;
            remote_provider(config)
        }
    }
}

#[cfg(any(feature = "openai", feature = "anthropic", feature = "local"))]
fn remote_provider(config: LLMConfig) -> Result<Arc<dyn LLMProvider>, ConfigError> {
    Ok(Arc::new(crate::llm::providers::UnifiedClient::from_config(
        config,
    )?))
}

#[cfg(not(any(feature = "openai", feature = "anthropic", feature = "local")))]
fn remote_provider(config: LLMConfig) -> Result<Arc<dyn LLMProvider>, ConfigError> {
    Err(ConfigError::ProviderUnavailable(format!(
        "{:?}",
        config.provider
    )))
}
