use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::aggregator::Aggregator;
use crate::app::{AppState, MacroChef};
use crate::auth::{AnonymousAuth, Identity, Session};
use crate::comments::SubscriptionRegistry;
use crate::config::{ChefConfig, ProviderConfig};
use crate::enrichment::{Enricher, ImageSearch, NoSearch, PexelsImages, VideoSearch, YouTubeVideos};
use crate::error::{ChefError, Result};
use crate::generation::{LlmRecipeGenerator, RecipeGenerator};
use crate::providers::{FallbackProvider, LlmProvider, ProviderFactory};
use crate::store::{CommentStore, CommunityStore, FirestoreStore, MemoryStore, SavedStore};

/// Generation provider selectable without a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
    OpenAI,
    Anthropic,
}

impl ProviderKind {
    /// Convert to provider name string used by the factory
    fn as_str(&self) -> &str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

/// The three collections, usually backed by one store
#[derive(Clone)]
struct Stores {
    community: Arc<dyn CommunityStore>,
    saved: Arc<dyn SavedStore>,
    comments: Arc<dyn CommentStore>,
}

impl Stores {
    fn from_one<S>(store: Arc<S>) -> Self
    where
        S: CommunityStore + SavedStore + CommentStore + 'static,
    {
        Self {
            community: store.clone(),
            saved: store.clone(),
            comments: store,
        }
    }
}

/// Builder for configuring a [`MacroChef`]
#[derive(Default)]
pub struct MacroChefBuilder {
    config: Option<ChefConfig>,
    provider_kind: Option<ProviderKind>,
    api_key: Option<String>,
    model: Option<String>,
    provider: Option<Arc<dyn LlmProvider>>,
    generator: Option<Arc<dyn RecipeGenerator>>,
    images: Option<Box<dyn ImageSearch>>,
    videos: Option<Box<dyn VideoSearch>>,
    stores: Option<Stores>,
    session: Option<Session>,
}

impl MacroChefBuilder {
    /// Use this configuration instead of loading `config.toml` and the environment
    pub fn config(mut self, config: ChefConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Generate with a specific provider instead of the configured default
    ///
    /// # Example
    /// ```
    /// use macrochef::{MacroChef, ProviderKind};
    ///
    /// let builder = MacroChef::builder()
    ///     .provider(ProviderKind::Anthropic)
    ///     .api_key("your-api-key");
    /// ```
    pub fn provider(mut self, provider: ProviderKind) -> Self {
        self.provider_kind = Some(provider);
        self
    }

    /// Set the API key for the selected provider
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model name for the selected provider
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Use an already constructed LLM provider for generation and vision
    pub fn llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the generation tier entirely
    pub fn generator(mut self, generator: Arc<dyn RecipeGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn image_search(mut self, images: Box<dyn ImageSearch>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn video_search(mut self, videos: Box<dyn VideoSearch>) -> Self {
        self.videos = Some(videos);
        self
    }

    /// Keep all recipes and comments in `store`
    ///
    /// # Example
    /// ```
    /// use macrochef::{MacroChef, MemoryStore};
    /// use std::sync::Arc;
    ///
    /// let builder = MacroChef::builder().store(Arc::new(MemoryStore::new()));
    /// ```
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: CommunityStore + SavedStore + CommentStore + 'static,
    {
        self.stores = Some(Stores::from_one(store));
        self
    }

    /// Act as this session instead of signing in
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Resolve every component and return a ready [`MacroChef`]
    ///
    /// Without an explicit store, Firestore is used when a `firebase` section
    /// is configured (after an anonymous sign-in) and an in-memory store with
    /// a local identity otherwise.
    ///
    /// # Errors
    /// Returns `ChefError` if:
    /// - The configuration cannot be loaded
    /// - No generation provider can be created
    /// - Anonymous sign-in fails
    pub async fn build(self) -> Result<MacroChef> {
        let config = match self.config {
            Some(config) => config,
            None => ChefConfig::load()?,
        };

        let provider = match self.provider {
            Some(provider) => Some(provider),
            None if self.generator.is_some() => None,
            None => Some(create_provider(
                &config,
                self.provider_kind,
                self.api_key,
                self.model,
            )?),
        };

        let generator: Arc<dyn RecipeGenerator> = match (self.generator, &provider) {
            (Some(generator), _) => generator,
            (None, Some(provider)) => Arc::new(LlmRecipeGenerator::new(provider.clone())),
            (None, None) => {
                return Err(ChefError::BuilderError(
                    "No generation provider configured".to_string(),
                ))
            }
        };

        let (stores, session) = match (self.stores, self.session) {
            (Some(stores), Some(session)) => (stores, session),
            (Some(stores), None) => (stores, Session::signed_in(Identity::local())),
            (None, session) => connect_stores(&config, session).await?,
        };

        let images = self.images.unwrap_or_else(|| image_search(&config));
        let videos = self.videos.unwrap_or_else(|| video_search(&config));
        let enricher = Enricher::new(
            images,
            videos,
            config.images.fallback_url.clone(),
            config.videos.min_score,
        );

        let aggregator = Aggregator::new(
            stores.community.clone(),
            stores.saved.clone(),
            generator,
            Arc::new(enricher),
        );
        let subscriptions = SubscriptionRegistry::new(
            stores.comments.clone(),
            config.comments.limit,
            Duration::from_millis(config.comments.poll_interval_ms),
        );

        info!("{}", session.status());
        Ok(MacroChef {
            config,
            session,
            provider,
            community: stores.community,
            saved: stores.saved,
            comments: stores.comments,
            aggregator,
            subscriptions,
            state: AppState::default(),
        })
    }
}

fn create_provider(
    config: &ChefConfig,
    kind: Option<ProviderKind>,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<Arc<dyn LlmProvider>> {
    let name = kind
        .map(|k| k.as_str().to_string())
        .unwrap_or_else(|| config.default_provider.clone());

    let configured = config.providers.get(&name);
    if kind.is_none() && api_key.is_none() && model.is_none() && configured.is_some() {
        return Ok(Arc::new(FallbackProvider::new(config)?));
    }

    // Start from the configured settings, if any, and apply the overrides
    let mut provider_config = match configured {
        Some(provider_config) => provider_config.clone(),
        None => ProviderConfig {
            enabled: true,
            model: ProviderFactory::default_model(&name)
                .ok_or_else(|| ChefError::BuilderError(format!("Unknown provider: {}", name)))?
                .to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            api_key: None,
            base_url: None,
        },
    };
    provider_config.enabled = true;
    if api_key.is_some() {
        provider_config.api_key = api_key;
    }
    if let Some(model) = model {
        provider_config.model = model;
    }

    Ok(Arc::from(ProviderFactory::create_with_timeout(
        &name,
        &provider_config,
        Duration::from_secs(config.timeout),
    )?))
}

async fn connect_stores(config: &ChefConfig, session: Option<Session>) -> Result<(Stores, Session)> {
    let Some(firebase) = &config.firebase else {
        info!("No firebase configuration, keeping recipes in memory");
        let session = session.unwrap_or_else(|| Session::signed_in(Identity::local()));
        return Ok((Stores::from_one(Arc::new(MemoryStore::new())), session));
    };

    let session = match session {
        Some(session) => session,
        None => {
            let api_key = firebase
                .api_key
                .clone()
                .or_else(|| std::env::var("FIREBASE_API_KEY").ok())
                .ok_or_else(|| {
                    ChefError::AuthenticationRequired(
                        "FIREBASE_API_KEY not found in config or environment".to_string(),
                    )
                })?;
            let auth = AnonymousAuth::new(api_key, firebase.identity_url.clone())
                .with_timeout(Duration::from_secs(config.timeout));
            Session::signed_in(auth.sign_in().await?)
        }
    };

    let store = FirestoreStore::new(
        firebase.firestore_url.clone(),
        firebase.project_id.clone(),
        firebase.app_id.clone(),
    )
    .with_timeout(Duration::from_secs(config.timeout))
    .with_id_token(session.identity().and_then(|i| i.id_token.clone()));

    Ok((Stores::from_one(Arc::new(store)), session))
}

fn image_search(config: &ChefConfig) -> Box<dyn ImageSearch> {
    match config
        .images
        .api_key
        .clone()
        .or_else(|| std::env::var("PEXELS_API_KEY").ok())
    {
        Some(api_key) => Box::new(
            PexelsImages::new(api_key, config.images.base_url.clone())
                .with_timeout(Duration::from_secs(config.timeout)),
        ),
        None => {
            warn!("PEXELS_API_KEY not set, generated recipes use the fallback image");
            Box::new(NoSearch)
        }
    }
}

fn video_search(config: &ChefConfig) -> Box<dyn VideoSearch> {
    match config
        .videos
        .api_key
        .clone()
        .or_else(|| std::env::var("YOUTUBE_API_KEY").ok())
    {
        Some(api_key) => Box::new(
            YouTubeVideos::new(api_key, config.videos.base_url.clone())
                .with_timeout(Duration::from_secs(config.timeout)),
        ),
        None => {
            warn!("YOUTUBE_API_KEY not set, generated recipes get no video");
            Box::new(NoSearch)
        }
    }
}
