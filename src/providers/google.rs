use crate::config::ProviderConfig;
use crate::error::{ChefError, Result};
use crate::http;
use crate::providers::{InlineImage, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: String,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        // Try config first, then fall back to environment variables
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                ChefError::BuilderError(
                    "GEMINI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        Ok(GoogleProvider {
            client: http::client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
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
        GoogleProvider {
            client: http::client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url,
            model,
            temperature: 0.7,
            max_tokens: 4000,
        }
    }

    async fn generate_content(&self, parts: Vec<Part<'_>>, json_output: bool) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
                response_mime_type: json_output.then_some("application/json"),
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(ChefError::from_status("Gemini", response).await);
        }

        let body: GeminiResponse = response.json().await?;
        debug!("{:?}", body);

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                ChefError::MalformedResponse("Gemini response contained no candidates".to_string())
            })
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn complete(&self, prompt: &str, json_output: bool) -> Result<String> {
        self.generate_content(vec![Part::Text { text: prompt }], json_output)
            .await
    }

    async fn describe_image(&self, prompt: &str, image: &InlineImage) -> Result<String> {
        let parts = vec![
            Part::Text { text: prompt },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: &image.mime_type,
                    data: &image.data,
                },
            },
        ];
        self.generate_content(parts, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::io::Write;

    fn provider(server: &Server) -> GoogleProvider {
        GoogleProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gemini-2.5-flash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_complete_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "fake_api_key".into()))
            .match_body(Matcher::PartialJsonString(
                r#"{"generationConfig": {"responseMimeType": "application/json"}}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "[]"}]}}]}"#)
            .create_async()
            .await;

        let result = provider(&server).complete("hello", true).await.unwrap();
        assert_eq!(result, "[]");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_describe_image_sends_inline_data() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJsonString(
                r#"{"contents": [{"parts": [{"text": "what is this"}, {"inlineData": {"mimeType": "image/png", "data": "aGk="}}]}]}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "tomato, basil"}]}}]}"#)
            .create_async()
            .await;

        let image = InlineImage {
            mime_type: "image/png".to_string(),
            data: "aGk=".to_string(),
        };
        let result = provider(&server)
            .describe_image("what is this", &image)
            .await
            .unwrap();
        assert_eq!(result, "tomato, basil");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_provider_unavailable() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let err = provider(&server).complete("hi", false).await.unwrap_err();
        assert!(matches!(err, ChefError::ProviderUnavailable(_)));
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let err = provider(&server).complete("hi", false).await.unwrap_err();
        assert!(matches!(err, ChefError::MalformedResponse(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_slow_response_times_out() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(br#"{"candidates": []}"#)
            })
            .create_async()
            .await;

        let started = std::time::Instant::now();
        let err = provider(&server)
            .with_timeout(Duration::from_millis(200))
            .complete("hi", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ChefError::ProviderUnavailable(_)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_provider_name() {
        let config = ProviderConfig {
            enabled: true,
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            api_key: Some("test-key".to_string()),
            base_url: None,
        };

        let provider = GoogleProvider::new(&config).unwrap();
        assert_eq!(provider.provider_name(), "google");
        assert_eq!(provider.base_url, GEMINI_BASE_URL);
    }
}
