use thiserror::Error;

/// Errors that can occur while assembling or interacting with recipes
#[derive(Error, Debug)]
pub enum ChefError {
    /// Network or HTTP failure talking to an external provider
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A provider answered with a payload of unexpected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A write was attempted without a signed-in identity
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// Empty ingredient list or otherwise unusable input
    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    /// The referenced recipe does not exist in the store
    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    /// Builder configuration error
    #[error("Builder error: {0}")]
    BuilderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Failed to read a local file (e.g. a photographed ingredient image)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for ChefError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChefError::MalformedResponse(err.to_string())
        } else {
            ChefError::ProviderUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ChefError {
    fn from(err: serde_json::Error) -> Self {
        ChefError::MalformedResponse(err.to_string())
    }
}

impl ChefError {
    /// Build a `ProviderUnavailable` error from a non-success HTTP response
    pub(crate) async fn from_status(provider: &str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ChefError::ProviderUnavailable(format!("{} API error ({}): {}", provider, status, body))
    }
}

pub type Result<T> = std::result::Result<T, ChefError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_malformed() {
        let err: ChefError = serde_json::from_str::<Vec<String>>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, ChefError::MalformedResponse(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = ChefError::AuthenticationRequired("You must be logged in to save recipes.".into());
        assert_eq!(
            err.to_string(),
            "Authentication required: You must be logged in to save recipes."
        );
        let err = ChefError::InsufficientInput("Please add ingredients first!".into());
        assert!(err.to_string().starts_with("Insufficient input"));
    }
}
