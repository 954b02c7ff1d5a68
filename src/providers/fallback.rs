use crate::config::ChefConfig;
use crate::error::{ChefError, Result};
use crate::providers::{InlineImage, LlmProvider, ProviderFactory};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

/// The two kinds of request a provider chain can serve
enum Request<'a> {
    Complete { prompt: &'a str, json_output: bool },
    DescribeImage { prompt: &'a str, image: &'a InlineImage },
}

pub struct FallbackProvider {
    providers: Vec<Box<dyn LlmProvider>>,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl FallbackProvider {
    /// Create a new fallback provider from configuration
    pub fn new(config: &ChefConfig) -> Result<Self> {
        if !config.fallback.enabled {
            // If fallback is disabled, just use the default provider
            let default_provider = ProviderFactory::get_default_provider(config)?;
            return Ok(FallbackProvider {
                providers: vec![default_provider],
                retry_attempts: 1,
                retry_delay_ms: 0,
            });
        }

        let mut providers = Vec::new();

        // Create providers in fallback order
        for provider_name in &config.fallback.order {
            if let Some(provider_config) = config.providers.get(provider_name) {
                if provider_config.enabled {
                    match ProviderFactory::create_with_timeout(
                        provider_name,
                        provider_config,
                        Duration::from_secs(config.timeout),
                    ) {
                        Ok(provider) => {
                            info!("Added '{}' to fallback chain", provider_name);
                            providers.push(provider);
                        }
                        Err(e) => {
                            warn!("Failed to initialize provider '{}': {}", provider_name, e);
                        }
                    }
                }
            } else {
                warn!(
                    "Provider '{}' in fallback order not found in configuration",
                    provider_name
                );
            }
        }

        Self::from_providers(
            providers,
            config.fallback.retry_attempts,
            config.fallback.retry_delay_ms,
        )
    }

    /// Build a chain from already constructed providers, tried in order
    pub fn from_providers(
        providers: Vec<Box<dyn LlmProvider>>,
        retry_attempts: u32,
        retry_delay_ms: u64,
    ) -> Result<Self> {
        if providers.is_empty() {
            return Err(ChefError::BuilderError(
                "No providers available in fallback configuration".to_string(),
            ));
        }

        Ok(FallbackProvider {
            providers,
            retry_attempts: retry_attempts.max(1),
            retry_delay_ms,
        })
    }

    /// Try a provider with linearly growing delay between attempts
    async fn try_provider_with_retry(
        &self,
        provider: &dyn LlmProvider,
        request: &Request<'_>,
    ) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!(
                "Attempting request with {} (attempt {}/{})",
                provider.provider_name(),
                attempt,
                self.retry_attempts
            );

            let result = match request {
                Request::Complete {
                    prompt,
                    json_output,
                } => provider.complete(prompt, *json_output).await,
                Request::DescribeImage { prompt, image } => {
                    provider.describe_image(prompt, image).await
                }
            };

            match result {
                Ok(result) => {
                    info!("Request served by {}", provider.provider_name());
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Provider {} failed (attempt {}/{}): {}",
                        provider.provider_name(),
                        attempt,
                        self.retry_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }

            // Sleep only if we need to retry
            if attempt < self.retry_attempts {
                let delay = Duration::from_millis(self.retry_delay_ms * attempt as u64);
                debug!("Waiting {:?} before retry", delay);
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ChefError::ProviderUnavailable(format!("{} was never attempted", provider.provider_name()))
        }))
    }

    async fn run(&self, request: Request<'_>) -> Result<String> {
        let mut all_errors: Vec<String> = Vec::new();
        let mut last_malformed = None;

        for provider in &self.providers {
            match self
                .try_provider_with_retry(provider.as_ref(), &request)
                .await
            {
                Ok(result) => return Ok(result),
                Err(e) => {
                    all_errors.push(format!("{}: {}", provider.provider_name(), e));
                    if let ChefError::MalformedResponse(_) = e {
                        last_malformed = Some(e);
                    }
                }
            }
        }

        // A single provider keeps its own error category
        if self.providers.len() == 1 {
            if let Some(e) = last_malformed {
                return Err(e);
            }
        }

        Err(ChefError::ProviderUnavailable(format!(
            "All providers failed:\n{}",
            all_errors.join("\n")
        )))
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    async fn complete(&self, prompt: &str, json_output: bool) -> Result<String> {
        self.run(Request::Complete {
            prompt,
            json_output,
        })
        .await
    }

    async fn describe_image(&self, prompt: &str, image: &InlineImage) -> Result<String> {
        self.run(Request::DescribeImage { prompt, image }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FallbackConfig, ProviderConfig};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyProvider {
        name: &'static str,
        failures_left: AtomicU32,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn complete(&self, prompt: &str, _json_output: bool) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(ChefError::ProviderUnavailable("boom".to_string()));
            }
            Ok(format!("{}:{}", self.name, prompt))
        }

        async fn describe_image(&self, _prompt: &str, _image: &InlineImage) -> Result<String> {
            Err(ChefError::MalformedResponse("no text".to_string()))
        }
    }

    fn flaky(name: &'static str, failures: u32) -> (Box<dyn LlmProvider>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = FlakyProvider {
            name,
            failures_left: AtomicU32::new(failures),
            calls: calls.clone(),
        };
        (Box::new(provider), calls)
    }

    fn provider_config(key: &str) -> ProviderConfig {
        ProviderConfig {
            enabled: true,
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            api_key: Some(key.to_string()),
            base_url: None,
        }
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let (provider, calls) = flaky("first", 2);
        let chain = FallbackProvider::from_providers(vec![provider], 3, 1).unwrap();

        let result = chain.complete("hi", false).await.unwrap();
        assert_eq!(result, "first:hi");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let (first, first_calls) = flaky("first", 10);
        let (second, _) = flaky("second", 0);
        let chain = FallbackProvider::from_providers(vec![first, second], 2, 1).unwrap();

        let result = chain.complete("hi", false).await.unwrap();
        assert_eq!(result, "second:hi");
        assert_eq!(first_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_all_fail() {
        let (first, _) = flaky("first", 10);
        let (second, _) = flaky("second", 10);
        let chain = FallbackProvider::from_providers(vec![first, second], 1, 0).unwrap();

        let err = chain.complete("hi", false).await.unwrap_err();
        assert!(matches!(err, ChefError::ProviderUnavailable(_)));
        assert!(err.to_string().contains("All providers failed"));
        assert!(err.to_string().contains("second: Provider unavailable: boom"));
    }

    #[tokio::test]
    async fn test_single_provider_keeps_malformed_category() {
        let (only, _) = flaky("only", 0);
        let chain = FallbackProvider::from_providers(vec![only], 1, 0).unwrap();
        let image = InlineImage {
            mime_type: "image/png".to_string(),
            data: String::new(),
        };

        let err = chain.describe_image("x", &image).await.unwrap_err();
        assert!(matches!(err, ChefError::MalformedResponse(_)));
    }

    #[test]
    fn test_fallback_disabled_uses_default() {
        let mut providers = HashMap::new();
        providers.insert("google".to_string(), provider_config("k"));
        let config = ChefConfig {
            providers,
            ..Default::default()
        };

        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.providers.len(), 1);
        assert_eq!(fallback.retry_attempts, 1);
        assert_eq!(fallback.provider_name(), "fallback");
    }

    #[test]
    fn test_fallback_multiple_providers() {
        let mut providers = HashMap::new();
        providers.insert("google".to_string(), provider_config("k1"));
        providers.insert("anthropic".to_string(), provider_config("k2"));

        let config = ChefConfig {
            providers,
            fallback: FallbackConfig {
                enabled: true,
                order: vec![
                    "google".to_string(),
                    "missing".to_string(),
                    "anthropic".to_string(),
                ],
                retry_attempts: 2,
                retry_delay_ms: 50,
            },
            ..Default::default()
        };

        let fallback = FallbackProvider::new(&config).unwrap();
        assert_eq!(fallback.providers.len(), 2);
    }

    #[test]
    fn test_fallback_no_providers() {
        let config = ChefConfig {
            fallback: FallbackConfig {
                enabled: true,
                order: vec!["google".to_string()],
                retry_attempts: 3,
                retry_delay_ms: 100,
            },
            ..Default::default()
        };

        let result = FallbackProvider::new(&config);
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("No providers available"));
        }
    }
}
