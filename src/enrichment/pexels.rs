use crate::enrichment::ImageSearch;
use crate::error::{ChefError, Result};
use crate::http;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Stock-photo lookup against the Pexels search API
pub struct PexelsImages {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    medium: String,
}

impl PexelsImages {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: http::client(http::DEFAULT_TIMEOUT),
            api_key,
            base_url,
        }
    }

    /// Give up on requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http::client(timeout);
        self
    }
}

#[async_trait]
impl ImageSearch for PexelsImages {
    async fn find_image(&self, recipe_name: &str) -> Result<Option<String>> {
        let query = format!("{} food", recipe_name);
        let response = self
            .client
            .get(format!("{}/v1/search", self.base_url))
            .header("Authorization", &self.api_key)
            .query(&[("query", query.as_str()), ("per_page", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChefError::from_status("Pexels", response).await);
        }

        let body: SearchResponse = response.json().await?;
        debug!("{:?}", body);
        Ok(body.photos.into_iter().next().map(|photo| photo.src.medium))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_find_image() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/search")
            .match_header("authorization", "pexels-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "Pad Thai food".into()),
                Matcher::UrlEncoded("per_page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"photos": [{"src": {"medium": "https://images.pexels.com/1.jpeg"}}]}"#)
            .create_async()
            .await;

        let images = PexelsImages::new("pexels-key".to_string(), server.url());
        let url = images.find_image("Pad Thai").await.unwrap();
        assert_eq!(url.as_deref(), Some("https://images.pexels.com/1.jpeg"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_photos() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"photos": []}"#)
            .create_async()
            .await;

        let images = PexelsImages::new("k".to_string(), server.url());
        assert!(images.find_image("Nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let images = PexelsImages::new("bad".to_string(), server.url());
        let err = images.find_image("Soup").await.unwrap_err();
        assert!(matches!(err, ChefError::ProviderUnavailable(_)));
    }
}
