use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Main application configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct ChefConfig {
    /// Default generation provider to use when not specified
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Fallback configuration for automatic provider switching
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Stock-photo lookup for generated recipes
    #[serde(default)]
    pub images: ImagesConfig,
    /// Tutorial video lookup for generated recipes
    #[serde(default)]
    pub videos: VideosConfig,
    /// Hosted document database and anonymous sign-in
    pub firebase: Option<FirebaseConfig>,
    /// Live comment subscriptions
    #[serde(default)]
    pub comments: CommentsConfig,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Configuration for a specific AI provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    pub enabled: bool,
    /// Model identifier (e.g., "gemini-2.5-flash", "gpt-4o-mini")
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

/// Configuration for provider fallback and retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Whether fallback is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Order of providers to try (first to last)
    #[serde(default)]
    pub order: Vec<String>,
    /// Number of retry attempts per provider before fallback
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Initial delay between retries in milliseconds (grows linearly per attempt)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            order: Vec::new(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Pexels photo search
#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_pexels_url")]
    pub base_url: String,
    /// Returned whenever the search fails or finds nothing
    #[serde(default = "default_fallback_image")]
    pub fallback_url: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_pexels_url(),
            fallback_url: default_fallback_image(),
        }
    }
}

/// YouTube Data API search
#[derive(Debug, Deserialize, Clone)]
pub struct VideosConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_youtube_url")]
    pub base_url: String,
    /// A candidate video is attached only when its word-overlap score exceeds this
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl Default for VideosConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_youtube_url(),
            min_score: default_min_score(),
        }
    }
}

/// Firestore REST and Identity Toolkit settings
#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseConfig {
    /// Web API key (can also be set via FIREBASE_API_KEY)
    pub api_key: Option<String>,
    pub project_id: String,
    /// Namespace under `artifacts/` holding all collections
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommentsConfig {
    /// Number of most recent comments pushed to a subscriber
    #[serde(default = "default_comment_limit")]
    pub limit: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            limit: default_comment_limit(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

// Default value functions
fn default_provider() -> String {
    "google".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_pexels_url() -> String {
    "https://api.pexels.com".to_string()
}

pub(crate) fn default_fallback_image() -> String {
    "https://images.pexels.com/photos/1640777/pexels-photo-1640777.jpeg".to_string()
}

fn default_youtube_url() -> String {
    "https://www.googleapis.com".to_string()
}

pub(crate) fn default_min_score() -> f64 {
    0.4
}

pub(crate) fn default_app_id() -> String {
    "macrochef-app".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

pub(crate) fn default_comment_limit() -> usize {
    5
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for ChefConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
            fallback: FallbackConfig::default(),
            images: ImagesConfig::default(),
            videos: VideosConfig::default(),
            firebase: None,
            comments: CommentsConfig::default(),
            timeout: default_timeout(),
        }
    }
}

impl ChefConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with MACROCHEF__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: MACROCHEF__PROVIDERS__GOOGLE__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// See [`ChefConfig::load`] for the source priority.
pub fn load_config() -> Result<ChefConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: MACROCHEF__PROVIDERS__GOOGLE__API_KEY
        .add_source(
            Environment::with_prefix("MACROCHEF")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
