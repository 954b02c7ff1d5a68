use crate::config::{ChefConfig, ProviderConfig};
use crate::error::{ChefError, Result};
use crate::http;
use crate::providers::{AnthropicProvider, GoogleProvider, LlmProvider, OpenAIProvider};
use std::time::Duration;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(provider_name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
        Self::create_with_timeout(provider_name, config, http::DEFAULT_TIMEOUT)
    }

    /// Create a provider whose requests give up after `timeout`
    pub fn create_with_timeout(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(ChefError::BuilderError(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )));
        }

        match provider_name {
            "google" => Ok(Box::new(GoogleProvider::new(config)?.with_timeout(timeout))),
            "openai" => Ok(Box::new(OpenAIProvider::new(config)?.with_timeout(timeout))),
            "anthropic" => Ok(Box::new(AnthropicProvider::new(config)?.with_timeout(timeout))),
            _ => Err(ChefError::BuilderError(format!(
                "Unknown provider: {}",
                provider_name
            ))),
        }
    }

    /// Get the default provider from configuration
    pub fn get_default_provider(config: &ChefConfig) -> Result<Box<dyn LlmProvider>> {
        let provider_name = &config.default_provider;
        let provider_config = config.providers.get(provider_name).ok_or_else(|| {
            ChefError::BuilderError(format!(
                "Default provider '{}' not found in configuration",
                provider_name
            ))
        })?;

        Self::create_with_timeout(
            provider_name,
            provider_config,
            Duration::from_secs(config.timeout),
        )
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["google", "openai", "anthropic"]
    }

    /// Model used when a provider is selected without any configuration
    pub fn default_model(provider_name: &str) -> Option<&'static str> {
        match provider_name {
            "google" => Some("gemini-2.5-flash"),
            "openai" => Some("gpt-4o-mini"),
            "anthropic" => Some("claude-sonnet-4-5"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn create_test_provider_config() -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            api_key: Some("test-key".to_string()),
            base_url: None,
        }
    }

    #[test]
    fn test_create_each_provider() {
        let config = create_test_provider_config();
        for name in ProviderFactory::available_providers() {
            let provider = ProviderFactory::create(name, &config).unwrap();
            assert_eq!(provider.provider_name(), name);
        }
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = create_test_provider_config();
        let result = ProviderFactory::create("unknown", &config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("Unknown provider"));
        }
    }

    #[test]
    fn test_create_disabled_provider() {
        let mut config = create_test_provider_config();
        config.enabled = false;

        let result = ProviderFactory::create("google", &config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("not enabled in configuration"));
        }
    }

    #[test]
    fn test_get_default_provider() {
        let mut providers = HashMap::new();
        providers.insert("google".to_string(), create_test_provider_config());

        let config = ChefConfig {
            providers,
            ..Default::default()
        };

        let provider = ProviderFactory::get_default_provider(&config).unwrap();
        assert_eq!(provider.provider_name(), "google");
    }

    #[test]
    fn test_get_default_provider_not_found() {
        let config = ChefConfig::default();

        let result = ProviderFactory::get_default_provider(&config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("not found"));
        }
    }

    #[test]
    fn test_default_models() {
        for name in ProviderFactory::available_providers() {
            assert!(ProviderFactory::default_model(name).is_some());
        }
        assert!(ProviderFactory::default_model("ollama").is_none());
    }
}
