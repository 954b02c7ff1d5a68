mod pexels;
mod youtube;

pub use pexels::PexelsImages;
pub use youtube::YouTubeVideos;

use crate::error::Result;
use crate::model::Recipe;
use async_trait::async_trait;
use log::{debug, warn};

/// Looks up a photo for a recipe name
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn find_image(&self, recipe_name: &str) -> Result<Option<String>>;
}

/// A candidate tutorial video returned by a search
#[derive(Debug, Clone, PartialEq)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
}

impl VideoCandidate {
    pub fn url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.video_id)
    }
}

/// Looks up the best tutorial video candidate for a recipe name
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn find_video(&self, recipe_name: &str) -> Result<Option<VideoCandidate>>;
}

/// Search used when no API key is configured; never finds anything
pub struct NoSearch;

#[async_trait]
impl ImageSearch for NoSearch {
    async fn find_image(&self, _recipe_name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[async_trait]
impl VideoSearch for NoSearch {
    async fn find_video(&self, _recipe_name: &str) -> Result<Option<VideoCandidate>> {
        Ok(None)
    }
}

/// Fraction of the recipe name's words that also appear in `title`.
///
/// Both sides are lower-cased and split on single spaces; a word counts
/// when it equals one of the title words.
pub fn word_overlap_score(recipe_name: &str, title: &str) -> f64 {
    let recipe_name = recipe_name.to_lowercase();
    let title = title.to_lowercase();
    let recipe_words: Vec<&str> = recipe_name.split(' ').collect();
    let title_words: Vec<&str> = title.split(' ').collect();

    let hits = recipe_words
        .iter()
        .filter(|word| title_words.contains(*word))
        .count();
    hits as f64 / recipe_words.len() as f64
}

/// Attaches a photo and an optional tutorial video to generated recipes.
///
/// Never fails: lookups that error out fall back to the fixed image URL and
/// to no video.
pub struct Enricher {
    images: Box<dyn ImageSearch>,
    videos: Box<dyn VideoSearch>,
    fallback_image: String,
    min_score: f64,
}

impl Enricher {
    pub fn new(
        images: Box<dyn ImageSearch>,
        videos: Box<dyn VideoSearch>,
        fallback_image: String,
        min_score: f64,
    ) -> Self {
        Self {
            images,
            videos,
            fallback_image,
            min_score,
        }
    }

    pub async fn image_for(&self, recipe_name: &str) -> String {
        match self.images.find_image(recipe_name).await {
            Ok(Some(url)) => url,
            Ok(None) => self.fallback_image.clone(),
            Err(e) => {
                warn!("Image lookup for '{}' failed: {}", recipe_name, e);
                self.fallback_image.clone()
            }
        }
    }

    pub async fn video_for(&self, recipe_name: &str) -> Option<String> {
        let candidate = match self.videos.find_video(recipe_name).await {
            Ok(candidate) => candidate?,
            Err(e) => {
                warn!("Video lookup for '{}' failed: {}", recipe_name, e);
                return None;
            }
        };

        let score = word_overlap_score(recipe_name, &candidate.title);
        if score > self.min_score {
            Some(candidate.url())
        } else {
            debug!(
                "Rejected video '{}' for '{}' (score {:.2})",
                candidate.title,
                recipe_name,
                score
            );
            None
        }
    }

    pub async fn enrich(&self, recipe: &mut Recipe) {
        recipe.image_url = self.image_for(&recipe.name).await;
        recipe.video_url = self.video_for(&recipe.name).await;
    }
}
