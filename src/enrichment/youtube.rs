use crate::enrichment::{VideoCandidate, VideoSearch};
use crate::error::{ChefError, Result};
use crate::http;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Tutorial video lookup against the YouTube Data API v3
pub struct YouTubeVideos {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

impl YouTubeVideos {
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
impl VideoSearch for YouTubeVideos {
    async fn find_video(&self, recipe_name: &str) -> Result<Option<VideoCandidate>> {
        let query = format!("{} recipe tutorial", recipe_name);
        let response = self
            .client
            .get(format!("{}/youtube/v3/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("q", query.as_str()),
                ("type", "video"),
                ("maxResults", "1"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChefError::from_status("YouTube", response).await);
        }

        let body: SearchResponse = response.json().await?;
        debug!("{:?}", body);

        Ok(body.items.into_iter().next().and_then(|item| {
            item.id.video_id.map(|video_id| VideoCandidate {
                video_id,
                title: item.snippet.title,
            })
        }))
    }
}
