use crate::config::ProviderConfig;
use crate::error::{ChefError, Result};
use crate::http;
use crate::providers::{InlineImage, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ChefError::BuilderError(
                    "OPENAI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        Ok(OpenAIProvider {
            client: http::client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Give up on requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http::client(timeout);
        self
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: http::client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url,
            model,
            temperature: 0.7,
            max_tokens: 4000,
        }
    }

    async fn chat(&self, content: Value, json_output: bool) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": content}
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });
        if json_output {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChefError::from_status("OpenAI", response).await);
        }

        let response_body: ChatResponse = response.json().await?;
        debug!("{:?}", response_body);

        response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ChefError::MalformedResponse(
                    "Failed to extract content from OpenAI response".to_string(),
                )
            })
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str, json_output: bool) -> Result<String> {
        self.chat(json!(prompt), json_output).await
    }

    async fn describe_image(&self, prompt: &str, image: &InlineImage) -> Result<String> {
        let content = json!([
            {"type": "text", "text": prompt},
            {
                "type": "image_url",
                "image_url": {"url": format!("data:{};base64,{}", image.mime_type, image.data)}
            }
        ]);
        self.chat(content, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn provider(server: &Server) -> OpenAIProvider {
        OpenAIProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gpt-4o-mini".to_string(),
        )
    }

    #[tokio::test]
    async fn test_complete() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer fake_api_key")
            .match_body(Matcher::PartialJsonString(
                r#"{"response_format": {"type": "json_object"}}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"content": "{\"recipes\": []}"}}]}"#)
            .create();

        let result = provider(&server).complete("make food", true).await.unwrap();
        assert_eq!(result, r#"{"recipes": []}"#);
        mock.assert();
    }

    #[tokio::test]
    async fn test_describe_image_uses_data_uri() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("data:image/jpeg;base64,AAAA".to_string()))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "eggs, milk"}}]}"#)
            .create();

        let image = InlineImage {
            mime_type: "image/jpeg".to_string(),
            data: "AAAA".to_string(),
        };
        let result = provider(&server)
            .describe_image("list it", &image)
            .await
            .unwrap();
        assert_eq!(result, "eggs, milk");
        mock.assert();
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Invalid request"}"#)
            .create();

        let result = provider(&server).complete("anything", false).await;
        assert!(matches!(result, Err(ChefError::ProviderUnavailable(_))));
        mock.assert();
    }

    #[tokio::test]
    async fn test_missing_content_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create();

        let result = provider(&server).complete("anything", false).await;
        assert!(matches!(result, Err(ChefError::MalformedResponse(_))));
    }

    #[test]
    fn test_provider_name() {
        let provider =
            OpenAIProvider::with_base_url("k".to_string(), "http://x".to_string(), "gpt-4".to_string());
        assert_eq!(provider.provider_name(), "openai");
    }
}
