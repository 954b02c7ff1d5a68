mod firestore;
mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::{Comment, Recipe};
use crate::reaction::{Reaction, ReactionTally};
use async_trait::async_trait;

/// Maximum number of community recipes read per query
pub const COMMUNITY_FETCH_LIMIT: usize = 20;

/// Public recipes shared by all users; the canonical copy for reactions
#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Up to `limit` recipes ordered by like count, most liked first
    async fn top_recipes(&self, limit: usize) -> Result<Vec<Recipe>>;

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>>;

    /// Insert or replace the recipe under its id
    async fn put_recipe(&self, recipe: &Recipe) -> Result<()>;

    /// Insert the recipe unless one with the same id exists; returns whether it was written
    async fn put_if_absent(&self, recipe: &Recipe) -> Result<bool> {
        let Some(id) = recipe.id.as_deref() else {
            return Ok(false);
        };
        if self.get_recipe(id).await?.is_some() {
            return Ok(false);
        }
        self.put_recipe(recipe).await?;
        Ok(true)
    }

    /// Apply `reaction` by `user_id` to the stored counters.
    ///
    /// Reads the current tally and writes the derived one back, so two
    /// concurrent clients can overwrite each other. Returns `None` when the
    /// recipe is not in the store.
    async fn react(
        &self,
        recipe_id: &str,
        user_id: &str,
        reaction: Reaction,
    ) -> Result<Option<ReactionTally>>;
}

/// Recipes a user saved for themselves
#[async_trait]
pub trait SavedStore: Send + Sync {
    /// Saved recipes, most recently saved first
    async fn saved_recipes(&self, user_id: &str) -> Result<Vec<Recipe>>;

    /// Insert or replace the recipe in the user's collection; the recipe must have an id
    async fn save_recipe(&self, user_id: &str, recipe: &Recipe) -> Result<()>;
}

/// Append-only comment threads, one per community recipe
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn add_comment(&self, recipe_id: &str, comment: &Comment) -> Result<()>;

    /// The `limit` most recent comments, newest first
    async fn recent_comments(&self, recipe_id: &str, limit: usize) -> Result<Vec<Comment>>;
}

/// Order recipes by save time, newest first; unsaved entries go last
pub(crate) fn sort_by_saved_at(recipes: &mut [Recipe]) {
    recipes.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
}
