//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called at startup.

pub mod dummy;
pub mod openai_compatible;

use tracing::warn;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct the configured provider.
///
/// Returns `Ok(None)` when the OpenAI provider is selected but `LLM_API_KEY`
/// is missing: the service still starts, and turns that reach the LLM branch
/// fail with "completion service not configured".
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<Option<LlmProvider>, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(Some(LlmProvider::Dummy(dummy::DummyProvider::default()))),
        "openai" | "openai-compatible" => {
            let Some(key) = api_key else {
                warn!("LLM_API_KEY not set — completion service disabled");
                return Ok(None);
            };
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                oai.model.clone(),
                oai.temperature,
                oai.timeout_seconds,
                key,
            )?;
            Ok(Some(LlmProvider::OpenAiCompatible(p)))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OpenAiConfig;

    fn llm_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            openai: OpenAiConfig {
                api_base_url: "http://localhost:0/v1/chat/completions".into(),
                model: "test-model".into(),
                temperature: 0.7,
                timeout_seconds: 1,
            },
        }
    }

    #[test]
    fn dummy_needs_no_key() {
        let p = build(&llm_config("dummy"), None).unwrap();
        assert!(matches!(p, Some(LlmProvider::Dummy(_))));
    }

    #[test]
    fn openai_without_key_is_unconfigured() {
        assert!(build(&llm_config("openai"), None).unwrap().is_none());
    }

    #[test]
    fn openai_with_key_builds() {
        let p = build(&llm_config("openai"), Some("sk-test".into())).unwrap();
        assert_eq!(p.map(|p| p.name()), Some("openai"));
    }

    #[test]
    fn unknown_provider_errors() {
        let err = build(&llm_config("mystery"), None).unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }
}
