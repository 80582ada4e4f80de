//! Provider selection from the environment.

use std::time::Duration;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const ANTHROPIC_MODEL_ENV: &str = "ANTHROPIC_MODEL";
pub const LOCAL_LLM_URL_ENV: &str = "LOCAL_LLM_URL";
pub const LOCAL_LLM_MODEL_ENV: &str = "LOCAL_LLM_MODEL";

/// LLM configuration loaded from environment or built explicitly
#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Anthropic,
    Local,
}

impl Provider {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "local" | "ollama" | "vllm" => Some(Provider::Local),
            _ => None,
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LLMConfig {
    /// Load from environment variables.
    ///
    /// Checks OpenAI, then Anthropic, then a local OpenAI-compatible server.
    pub fn from_env() -> Result<Self, ConfigError> {
        [Provider::OpenAI, Provider::Anthropic, Provider::Local]
            .into_iter()
            .find_map(Self::from_env_for)
            .ok_or(ConfigError::NoProviderConfigured)
    }

    /// Load a specific provider's settings, if its variables are present.
    pub fn from_env_for(provider: Provider) -> Option<Self> {
        match provider {
            Provider::OpenAI => env_nonempty(OPENAI_API_KEY_ENV).map(|key| {
                let mut config = Self::openai(
                    &key,
                    &env_nonempty(OPENAI_MODEL_ENV).unwrap_or_else(|| "gpt-4o-mini".to_string()),
                );
                config.base_url = env_nonempty(OPENAI_BASE_URL_ENV);
                config
            }),
            Provider::Anthropic => env_nonempty(ANTHROPIC_API_KEY_ENV).map(|key| {
                Self::anthropic(
                    &key,
                    &env_nonempty(ANTHROPIC_MODEL_ENV)
                        .unwrap_or_else(|| "claude-3-5-sonnet-latest".to_string()),
                )
            }),
            Provider::Local => env_nonempty(LOCAL_LLM_URL_ENV).map(|url| {
                Self::local(
                    &url,
                    &env_nonempty(LOCAL_LLM_MODEL_ENV).unwrap_or_else(|| "default".to_string()),
                )
            }),
        }
    }

    /// Create OpenAI config
    pub fn openai(api_key: &str, model: &str) -> Self {
        Self {
            provider: Provider::OpenAI,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: None,
            timeout_secs: 60,
        }
    }

    /// Create Anthropic config
    pub fn anthropic(api_key: &str, model: &str) -> Self {
        Self {
            provider: Provider::Anthropic,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: None,
            timeout_secs: 60,
        }
    }

    /// Create local config
    pub fn local(url: &str, model: &str) -> Self {
        Self {
            provider: Provider::Local,
            api_key: String::new(),
            model: model.to_string(),
            base_url: Some(url.trim_end_matches('/').to_string()),
            timeout_secs: 120,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No LLM provider configured. Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or LOCAL_LLM_URL")]
    NoProviderConfigured,
    #[error("Provider {0:?} is not compiled in; enable the matching cargo feature")]
    ProviderUnavailable(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Read an integer override, clamped to `[min, max]`. Unset or blank means `default`.
pub(crate) fn env_usize(name: &str, default: usize, min: usize, max: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.trim();
            if v.is_empty() {
                return Ok(default);
            }
            let parsed = v
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid(format!("{name}={v:?} (expected integer)")))?;
            Ok(parsed.clamp(min, max))
        }
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(ConfigError::Invalid(format!("failed to read {name}: {e}"))),
    }
}

/// Like [`env_usize`] for fractional values.
pub(crate) fn env_f64(name: &str, default: f64, min: f64, max: f64) -> Result<f64, ConfigError> {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.trim();
            if v.is_empty() {
                return Ok(default);
            }
            let parsed = v
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| ConfigError::Invalid(format!("{name}={v:?} (expected number)")))?;
            Ok(parsed.clamp(min, max))
        }
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(ConfigError::Invalid(format!("failed to read {name}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = LLMConfig::openai("test-key", "gpt-4");
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, "gpt-4");

        let local = LLMConfig::local("http://localhost:11434/", "llama3");
        assert_eq!(local.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(local.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("Claude"), Some(Provider::Anthropic));
        assert_eq!(Provider::parse("ollama"), Some(Provider::Local));
        assert_eq!(Provider::parse("mystery"), None);
    }

    #[test]
    fn test_env_usize_clamps_and_defaults() {
        std::env::set_var("LITMINE_TEST_ENV_USIZE", " 500 ");
        assert_eq!(env_usize("LITMINE_TEST_ENV_USIZE", 4, 1, 64).unwrap(), 64);
        std::env::set_var("LITMINE_TEST_ENV_USIZE", "");
        assert_eq!(env_usize("LITMINE_TEST_ENV_USIZE", 4, 1, 64).unwrap(), 4);
        std::env::set_var("LITMINE_TEST_ENV_USIZE", "lots");
        assert!(env_usize("LITMINE_TEST_ENV_USIZE", 4, 1, 64).is_err());
        std::env::remove_var("LITMINE_TEST_ENV_USIZE");
        assert_eq!(env_usize("LITMINE_TEST_ENV_USIZE", 4, 1, 64).unwrap(), 4);
    }

    #[test]
    fn test_env_f64_rejects_nan() {
        std::env::set_var("LITMINE_TEST_ENV_F64", "NaN");
        assert!(env_f64("LITMINE_TEST_ENV_F64", 0.8, 0.0, 1.0).is_err());
        std::env::set_var("LITMINE_TEST_ENV_F64", "1.5");
        assert_eq!(env_f64("LITMINE_TEST_ENV_F64", 0.8, 0.0, 1.0).unwrap(), 1.0);
        std::env::remove_var("LITMINE_TEST_ENV_F64");
    }
}
