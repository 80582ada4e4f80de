use crate::ProviderArgs;
use anyhow::{Context, Result};
use litmine_llm::{create_provider, LLMProvider};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

/// Resolve `--provider` / `--mock-response` into a provider.
///
/// A mock response file with the default `auto` provider selects the mock.
pub(crate) fn select(args: &ProviderArgs) -> Result<Arc<dyn LLMProvider>> {
    let mut options = HashMap::new();
    let mut kind = args.provider.trim().to_ascii_lowercase();
    if let Some(path) = &args.mock_response {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading mock response {}", path.display()))?;
        options.insert("response".to_string(), text);
        if kind == "auto" {
            kind = "mock".to_string();
        }
    }

    let provider = create_provider(&kind, &options)
        .with_context(|| format!("selecting language model provider `{kind}`"))?;
    tracing::info!(provider = %kind, model = %provider.model_info().name, "provider selected");
    Ok(provider)
}
