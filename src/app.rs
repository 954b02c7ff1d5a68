use crate::aggregator::{Aggregator, RecipeRequest};
use crate::auth::Session;
use crate::builder::MacroChefBuilder;
use crate::comments::{CommentFeed, SubscriptionRegistry};
use crate::config::ChefConfig;
use crate::error::{ChefError, Result};
use crate::model::{Comment, GenerationTargets, Provenance, Recipe};
use crate::providers::LlmProvider;
use crate::reaction::{Reaction, ReactionTally};
use crate::store::{CommentStore, CommunityStore, SavedStore, COMMUNITY_FETCH_LIMIT};
use crate::vision::{self, ImageSource};
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

/// Which list the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Generated,
    Community,
    Saved,
}

/// The recipe list currently shown and where it came from
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub recipes: Vec<Recipe>,
    pub tab: Tab,
}

impl AppState {
    fn show(&mut self, tab: Tab, recipes: Vec<Recipe>) -> &[Recipe] {
        self.tab = tab;
        self.recipes = recipes;
        &self.recipes
    }

    fn find(&self, recipe_id: &str) -> Option<&Recipe> {
        self.recipes
            .iter()
            .find(|r| r.id.as_deref() == Some(recipe_id))
    }
}

/// The recipe assistant: generation, sharing, reactions and comments
pub struct MacroChef {
    pub(crate) config: ChefConfig,
    pub(crate) session: Session,
    pub(crate) provider: Option<Arc<dyn LlmProvider>>,
    pub(crate) community: Arc<dyn CommunityStore>,
    pub(crate) saved: Arc<dyn SavedStore>,
    pub(crate) comments: Arc<dyn CommentStore>,
    pub(crate) aggregator: Aggregator,
    pub(crate) subscriptions: SubscriptionRegistry,
    pub(crate) state: AppState,
}

impl MacroChef {
    pub fn builder() -> MacroChefBuilder {
        MacroChefBuilder::default()
    }

    pub fn config(&self) -> &ChefConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Assemble recipes for the given ingredients and show them
    pub async fn generate(
        &mut self,
        ingredients_text: &str,
        targets: GenerationTargets,
    ) -> Result<&[Recipe]> {
        let request = RecipeRequest::new(ingredients_text, targets);
        let user_id = self.session.identity().map(|i| i.user_id.as_str());
        let recipes = self.aggregator.assemble(&request, user_id).await?;
        Ok(self.state.show(Tab::Generated, recipes))
    }

    /// Detect ingredients in a photo, normalized
    pub async fn ingredients_from_image(&self, source: ImageSource) -> Result<Vec<String>> {
        let provider = self.provider.as_deref().ok_or_else(|| {
            ChefError::ProviderUnavailable("No vision provider configured".to_string())
        })?;
        vision::extract_ingredients(provider, source).await
    }

    /// Show the most liked community recipes, regardless of ingredients
    pub async fn show_community(&mut self) -> Result<&[Recipe]> {
        let recipes = self
            .community
            .top_recipes(COMMUNITY_FETCH_LIMIT)
            .await?
            .into_iter()
            .map(|r| r.with_provenance(Provenance::Community))
            .collect();
        Ok(self.state.show(Tab::Community, recipes))
    }

    /// Show the signed-in user's saved recipes, newest first
    pub async fn show_saved(&mut self) -> Result<&[Recipe]> {
        let identity = self.session.require("view saved recipes")?;
        let recipes = self
            .saved
            .saved_recipes(&identity.user_id)
            .await?
            .into_iter()
            .map(|r| r.with_provenance(Provenance::Saved))
            .collect();
        Ok(self.state.show(Tab::Saved, recipes))
    }

    pub async fn has_saved_recipes(&self) -> Result<bool> {
        match self.session.identity() {
            Some(identity) => Ok(!self.saved.saved_recipes(&identity.user_id).await?.is_empty()),
            None => Ok(false),
        }
    }

    /// Save a recipe to the user's collection and share it with the community.
    ///
    /// The community copy is only written when none exists yet, so its
    /// reactions are never reset by a later save.
    pub async fn save(&mut self, recipe: &Recipe) -> Result<Recipe> {
        let user_id = self.session.require("save recipes")?.user_id.clone();

        let mut saved = recipe.clone();
        saved.ensure_id();
        saved.saved_by = Some(user_id.clone());
        saved.saved_at = Some(Utc::now());
        self.saved.save_recipe(&user_id, &saved).await?;

        let mut public = recipe.clone();
        public.id = saved.id.clone();
        public.saved_by = None;
        public.saved_at = None;
        public.created_by = Some(user_id);
        public.created_at = Some(Utc::now());
        if self.community.put_if_absent(&public).await? {
            debug!("Shared '{}' with the community", public.name);
        }

        info!("Saved '{}'", saved.name);
        Ok(saved)
    }

    /// Save a recipe by id, looking in the shown list first and then the community
    pub async fn save_by_id(&mut self, recipe_id: &str) -> Result<Recipe> {
        let recipe = match self.state.find(recipe_id) {
            Some(recipe) => recipe.clone(),
            None => self
                .community
                .get_recipe(recipe_id)
                .await?
                .ok_or_else(|| ChefError::RecipeNotFound(recipe_id.to_string()))?,
        };
        self.save(&recipe).await
    }

    /// Like or dislike a community recipe; returns the updated counters
    pub async fn react(&mut self, recipe_id: &str, reaction: Reaction) -> Result<ReactionTally> {
        let user_id = self.session.require("rate recipes")?.user_id.clone();

        let tally = self
            .community
            .react(recipe_id, &user_id, reaction)
            .await?
            .ok_or_else(|| ChefError::RecipeNotFound(recipe_id.to_string()))?;

        for recipe in self
            .state
            .recipes
            .iter_mut()
            .filter(|r| r.id.as_deref() == Some(recipe_id))
        {
            tally.write_to(recipe);
        }
        Ok(tally)
    }

    /// Append a comment to a community recipe
    pub async fn comment(&self, recipe_id: &str, text: &str) -> Result<Comment> {
        let identity = self.session.require("comment")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ChefError::InsufficientInput(
                "Comment cannot be empty".to_string(),
            ));
        }

        let comment = Comment::new(identity.user_id.clone(), text);
        self.comments.add_comment(recipe_id, &comment).await?;
        Ok(comment)
    }

    /// The most recent comments of a recipe, read once
    pub async fn recent_comments(&self, recipe_id: &str) -> Result<Vec<Comment>> {
        self.comments
            .recent_comments(recipe_id, self.config.comments.limit)
            .await
    }

    /// Subscribe to a recipe's comments; an earlier subscription to it is replaced
    pub fn open_comments(&mut self, recipe_id: &str) -> CommentFeed {
        self.subscriptions.subscribe(recipe_id)
    }

    pub fn close_comments(&mut self, recipe_id: &str) -> bool {
        self.subscriptions.cancel(recipe_id)
    }

    /// Cancel every live subscription
    pub fn shutdown(&mut self) {
        debug!(
            "Closing {} comment subscription(s)",
            self.subscriptions.active_count()
        );
        self.subscriptions.cancel_all();
    }
}
