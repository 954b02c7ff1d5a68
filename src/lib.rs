pub mod aggregator;
pub mod app;
pub mod auth;
pub mod builder;
pub mod comments;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod generation;
mod http;
pub mod ingredients;
pub mod model;
pub mod providers;
pub mod reaction;
pub mod render;
pub mod store;
pub mod vision;

// Re-export key types
pub use aggregator::{Aggregator, RecipeRequest, RECIPES_PER_REQUEST};
pub use app::{AppState, MacroChef, Tab};
pub use auth::{Identity, Session};
pub use builder::{MacroChefBuilder, ProviderKind};
pub use comments::{CommentFeed, SubscriptionRegistry};
pub use config::ChefConfig;
pub use enrichment::{Enricher, ImageSearch, VideoCandidate, VideoSearch};
pub use error::ChefError;
pub use generation::RecipeGenerator;
pub use model::{Comment, GenerationTargets, Macros, Provenance, Recipe};
pub use reaction::{Reaction, ReactionState, ReactionTally};
pub use store::{CommentStore, CommunityStore, FirestoreStore, MemoryStore, SavedStore};
pub use vision::ImageSource;

/// Assemble recipes for a comma-separated ingredient list with the default setup
///
/// Loads `config.toml` and the environment, signs in if a database is
/// configured, and runs one request with default macro targets.
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let recipes = macrochef::recommend("chicken, rice").await?;
/// for recipe in &recipes {
///     println!("{} ({})", recipe.name, recipe.provenance);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn recommend(ingredients: &str) -> Result<Vec<Recipe>, ChefError> {
    let mut chef = MacroChef::builder().build().await?;
    let recipes = chef
        .generate(ingredients, GenerationTargets::default())
        .await?
        .to_vec();
    chef.shutdown();
    Ok(recipes)
}
