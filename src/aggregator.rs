use crate::enrichment::Enricher;
use crate::error::{ChefError, Result};
use crate::generation::RecipeGenerator;
use crate::ingredients::matches_any;
use crate::model::{GenerationTargets, Provenance, Recipe};
use crate::store::{CommunityStore, SavedStore, COMMUNITY_FETCH_LIMIT};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

/// Total number of recipes offered per request
pub const RECIPES_PER_REQUEST: usize = 3;
/// Community recipes taken at most
pub const COMMUNITY_SLOTS: usize = 2;
/// Saved recipes taken at most
pub const SAVED_SLOTS: usize = 1;

/// What the user asked for
#[derive(Debug, Clone)]
pub struct RecipeRequest {
    /// Ingredient text as entered, passed verbatim to the generator
    pub ingredient_text: String,
    /// Normalized ingredient terms used for matching
    pub ingredients: Vec<String>,
    pub targets: GenerationTargets,
}

impl RecipeRequest {
    pub fn new(ingredient_text: impl Into<String>, targets: GenerationTargets) -> Self {
        let ingredient_text = ingredient_text.into();
        let ingredients = crate::ingredients::normalize(&ingredient_text);
        Self {
            ingredient_text,
            ingredients,
            targets,
        }
    }
}

/// Builds the recipe list from community, saved and generated recipes, in that priority
pub struct Aggregator {
    community: Arc<dyn CommunityStore>,
    saved: Arc<dyn SavedStore>,
    generator: Arc<dyn RecipeGenerator>,
    enricher: Arc<Enricher>,
}

impl Aggregator {
    pub fn new(
        community: Arc<dyn CommunityStore>,
        saved: Arc<dyn SavedStore>,
        generator: Arc<dyn RecipeGenerator>,
        enricher: Arc<Enricher>,
    ) -> Self {
        Self {
            community,
            saved,
            generator,
            enricher,
        }
    }

    /// Assemble up to three recipes for `request`.
    ///
    /// Community and saved lookups that fail contribute nothing; a failed
    /// generation fails the whole request. Recipes are not deduplicated
    /// across tiers.
    pub async fn assemble(&self, request: &RecipeRequest, user_id: Option<&str>) -> Result<Vec<Recipe>> {
        if request.ingredients.is_empty() {
            return Err(ChefError::InsufficientInput(
                "Please add ingredients first!".to_string(),
            ));
        }

        let mut recipes = self.community_tier(&request.ingredients).await;
        recipes.extend(self.saved_tier(&request.ingredients, user_id).await);

        let remaining = RECIPES_PER_REQUEST.saturating_sub(recipes.len());
        if remaining > 0 {
            recipes.extend(self.generated_tier(request, remaining, user_id).await?);
        }

        info!(
            "Assembled {} recipe(s): {}",
            recipes.len(),
            recipes
                .iter()
                .map(|r| r.provenance.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(recipes)
    }

    async fn community_tier(&self, ingredients: &[String]) -> Vec<Recipe> {
        match self.community.top_recipes(COMMUNITY_FETCH_LIMIT).await {
            Ok(candidates) => take_matching(candidates, ingredients, COMMUNITY_SLOTS, Provenance::Community),
            Err(e) => {
                warn!("Error fetching community recipes: {}", e);
                Vec::new()
            }
        }
    }

    async fn saved_tier(&self, ingredients: &[String], user_id: Option<&str>) -> Vec<Recipe> {
        let Some(user_id) = user_id else {
            debug!("No signed-in user, skipping saved recipes");
            return Vec::new();
        };

        match self.saved.saved_recipes(user_id).await {
            Ok(candidates) => take_matching(candidates, ingredients, SAVED_SLOTS, Provenance::Saved),
            Err(e) => {
                warn!("Error fetching saved recipes: {}", e);
                Vec::new()
            }
        }
    }

    async fn generated_tier(
        &self,
        request: &RecipeRequest,
        count: usize,
        user_id: Option<&str>,
    ) -> Result<Vec<Recipe>> {
        let mut generated = self
            .generator
            .generate(count, &request.ingredient_text, &request.targets)
            .await?;
        if generated.len() > count {
            debug!(
                "Generator returned {} recipes, keeping the first {}",
                generated.len(),
                count
            );
            generated.truncate(count);
        }

        let mut recipes = Vec::with_capacity(generated.len());
        for mut recipe in generated {
            recipe.ensure_id();
            recipe.provenance = Provenance::Generated;
            recipe.likes = 0;
            recipe.dislikes = 0;
            recipe.liked_by.clear();
            recipe.disliked_by.clear();
            self.enricher.enrich(&mut recipe).await;

            // Generated recipes are shared with the community right away
            let mut public = recipe.clone();
            public.created_by = Some(user_id.unwrap_or("anonymous").to_string());
            public.created_at = Some(Utc::now());
            if let Err(e) = self.community.put_recipe(&public).await {
                warn!("Could not publish generated recipe '{}': {}", recipe.name, e);
            }

            recipes.push(recipe);
        }
        Ok(recipes)
    }
}

/// First `slots` candidates mentioning any ingredient, in their given order
fn take_matching(
    candidates: Vec<Recipe>,
    ingredients: &[String],
    slots: usize,
    provenance: Provenance,
) -> Vec<Recipe> {
    candidates
        .into_iter()
        .filter(|recipe| matches_any(&recipe.ingredients, ingredients))
        .take(slots)
        .map(|recipe| recipe.with_provenance(provenance))
        .collect()
}
