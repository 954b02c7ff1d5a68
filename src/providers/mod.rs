mod anthropic;
mod factory;
mod fallback;
mod google;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use fallback::FallbackProvider;
pub use google::GoogleProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::{build_recipe_prompt, INGREDIENT_VISION_PROMPT, RECIPE_FORMAT_PROMPT};

use crate::error::Result;
use async_trait::async_trait;

/// An image handed to a multimodal model, already base64 encoded
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Unified trait for all LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "google", "openai")
    fn provider_name(&self) -> &str;

    /// Send a text prompt and return the model's text answer.
    ///
    /// With `json_output` the provider is asked to answer with JSON only.
    async fn complete(&self, prompt: &str, json_output: bool) -> Result<String>;

    /// Send a prompt together with an image and return the model's text answer
    async fn describe_image(&self, prompt: &str, image: &InlineImage) -> Result<String>;
}
