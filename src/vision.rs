use crate::error::{ChefError, Result};
use crate::ingredients;
use crate::providers::{InlineImage, LlmProvider, INGREDIENT_VISION_PROMPT};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use std::path::Path;

/// Represents the source of a photographed set of ingredients
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image from a file path
    Path(String),
    /// Raw image bytes with their MIME type
    Bytes { data: Vec<u8>, mime_type: String },
    /// Image as base64-encoded data with its MIME type
    Base64 { data: String, mime_type: String },
}

impl ImageSource {
    async fn into_inline(self) -> Result<InlineImage> {
        match self {
            ImageSource::Path(path) => {
                let data = tokio::fs::read(&path).await?;
                Ok(InlineImage {
                    mime_type: mime_type_for(Path::new(&path)).to_string(),
                    data: STANDARD.encode(&data),
                })
            }
            ImageSource::Bytes { data, mime_type } => Ok(InlineImage {
                mime_type,
                data: STANDARD.encode(&data),
            }),
            ImageSource::Base64 { data, mime_type } => Ok(InlineImage { mime_type, data }),
        }
    }
}

/// Guess an image MIME type from the file extension, defaulting to JPEG
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

/// Ask a multimodal model which ingredients are visible in the image.
///
/// Returns the raw comma-separated extraction.
pub async fn extract_ingredient_text(
    provider: &dyn LlmProvider,
    source: ImageSource,
) -> Result<String> {
    let image = source.into_inline().await?;
    debug!(
        "Sending {} image ({} base64 chars) to {}",
        image.mime_type,
        image.data.len(),
        provider.provider_name()
    );

    let text = provider
        .describe_image(INGREDIENT_VISION_PROMPT, &image)
        .await?;
    debug!("Extracted ingredient text: {}", text);
    Ok(text)
}

/// Extract and normalize ingredients from an image.
///
/// An image in which nothing recognisable was found is `InsufficientInput`.
pub async fn extract_ingredients(
    provider: &dyn LlmProvider,
    source: ImageSource,
) -> Result<Vec<String>> {
    let text = extract_ingredient_text(provider, source).await?;
    let terms = ingredients::normalize(&text);
    if terms.is_empty() {
        return Err(ChefError::InsufficientInput(
            "No ingredients detected in image".to_string(),
        ));
    }
    Ok(terms)
}
