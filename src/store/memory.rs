use crate::error::{ChefError, Result};
use crate::model::{Comment, Recipe};
use crate::reaction::{Reaction, ReactionTally};
use crate::store::{sort_by_saved_at, CommentStore, CommunityStore, SavedStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-process store implementing every collection.
///
/// Used for offline runs and tests. Community recipes keep insertion order
/// so equal like counts rank deterministically.
#[derive(Default)]
pub struct MemoryStore {
    community: Mutex<Vec<Recipe>>,
    saved: Mutex<HashMap<String, Vec<Recipe>>>,
    comments: Mutex<HashMap<String, Vec<Comment>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn require_id(recipe: &Recipe) -> Result<&str> {
    recipe.id.as_deref().ok_or_else(|| {
        ChefError::InsufficientInput("Recipe must have an id to be stored".to_string())
    })
}

fn upsert(recipes: &mut Vec<Recipe>, recipe: &Recipe, id: &str) {
    match recipes.iter_mut().find(|r| r.id.as_deref() == Some(id)) {
        Some(existing) => *existing = recipe.clone(),
        None => recipes.push(recipe.clone()),
    }
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn top_recipes(&self, limit: usize) -> Result<Vec<Recipe>> {
        let mut recipes = self.community.lock().unwrap().clone();
        recipes.sort_by(|a, b| b.likes.cmp(&a.likes));
        recipes.truncate(limit);
        Ok(recipes)
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let community = self.community.lock().unwrap();
        Ok(community.iter().find(|r| r.id.as_deref() == Some(id)).cloned())
    }

    async fn put_recipe(&self, recipe: &Recipe) -> Result<()> {
        let id = require_id(recipe)?;
        upsert(&mut self.community.lock().unwrap(), recipe, id);
        Ok(())
    }

    async fn react(
        &self,
        recipe_id: &str,
        user_id: &str,
        reaction: Reaction,
    ) -> Result<Option<ReactionTally>> {
        let mut community = self.community.lock().unwrap();
        let Some(recipe) = community
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(recipe_id))
        else {
            return Ok(None);
        };

        let tally = ReactionTally::of(recipe).apply(user_id, reaction);
        tally.write_to(recipe);
        Ok(Some(tally))
    }
}

#[async_trait]
impl SavedStore for MemoryStore {
    async fn saved_recipes(&self, user_id: &str) -> Result<Vec<Recipe>> {
        let mut recipes = self
            .saved
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default();
        sort_by_saved_at(&mut recipes);
        Ok(recipes)
    }

    async fn save_recipe(&self, user_id: &str, recipe: &Recipe) -> Result<()> {
        let id = require_id(recipe)?;
        let mut saved = self.saved.lock().unwrap();
        upsert(saved.entry(user_id.to_string()).or_default(), recipe, id);
        Ok(())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn add_comment(&self, recipe_id: &str, comment: &Comment) -> Result<()> {
        let mut comments = self.comments.lock().unwrap();
        let thread = comments.entry(recipe_id.to_string()).or_default();
        let mut comment = comment.clone();
        comment
            .id
            .get_or_insert_with(|| format!("c{}", thread.len() + 1));
        thread.push(comment);
        Ok(())
    }

    async fn recent_comments(&self, recipe_id: &str, limit: usize) -> Result<Vec<Comment>> {
        let comments = self.comments.lock().unwrap();
        let mut thread = comments.get(recipe_id).cloned().unwrap_or_default();
        thread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        thread.truncate(limit);
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn recipe(id: &str, likes: u64) -> Recipe {
        Recipe {
            id: Some(id.to_string()),
            name: format!("Recipe {}", id),
            likes,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_top_recipes_ranked_and_capped() {
        let store = MemoryStore::new();
        for (id, likes) in [("a", 5), ("b", 50), ("c", 5), ("d", 20)] {
            store.put_recipe(&recipe(id, likes)).await.unwrap();
        }

        let top = store.top_recipes(3).await.unwrap();
        let ids: Vec<_> = top.iter().map(|r| r.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["b", "d", "a"]);
    }

    #[tokio::test]
    async fn test_put_replaces_by_id() {
        let store = MemoryStore::new();
        store.put_recipe(&recipe("a", 1)).await.unwrap();
        store.put_recipe(&recipe("a", 9)).await.unwrap();
        assert_eq!(store.top_recipes(20).await.unwrap().len(), 1);
        assert_eq!(store.get_recipe("a").await.unwrap().unwrap().likes, 9);
    }

    #[tokio::test]
    async fn test_put_without_id_rejected() {
        let store = MemoryStore::new();
        let err = store.put_recipe(&Recipe::default()).await.unwrap_err();
        assert!(matches!(err, ChefError::InsufficientInput(_)));
    }

    #[tokio::test]
    async fn test_put_if_absent() {
        let store = MemoryStore::new();
        assert!(store.put_if_absent(&recipe("a", 1)).await.unwrap());
        assert!(!store.put_if_absent(&recipe("a", 7)).await.unwrap());
        assert_eq!(store.get_recipe("a").await.unwrap().unwrap().likes, 1);
    }

    #[tokio::test]
    async fn test_react_updates_canonical_copy() {
        let store = MemoryStore::new();
        store.put_recipe(&recipe("a", 0)).await.unwrap();

        let tally = store.react("a", "u1", Reaction::Like).await.unwrap().unwrap();
        assert_eq!(tally.likes, 1);
        let stored = store.get_recipe("a").await.unwrap().unwrap();
        assert!(stored.liked_by.contains("u1"));

        assert!(store.react("missing", "u1", Reaction::Like).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_saved_recipes_newest_first() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for (id, age) in [("old", 3), ("new", 1), ("mid", 2)] {
            let mut r = recipe(id, 0);
            r.saved_at = Some(now - Duration::hours(age));
            store.save_recipe("u1", &r).await.unwrap();
        }

        let saved = store.saved_recipes("u1").await.unwrap();
        let ids: Vec<_> = saved.iter().map(|r| r.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert!(store.saved_recipes("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_comments_newest_first_and_limited() {
        let store = MemoryStore::new();
        let start = Utc::now();
        for i in 0..7 {
            let mut comment = Comment::new("u1", format!("comment {}", i));
            comment.created_at = start + Duration::seconds(i);
            store.add_comment("a", &comment).await.unwrap();
        }

        let recent = store.recent_comments("a", 5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].text, "comment 6");
        assert_eq!(recent[4].text, "comment 2");
        assert!(recent.iter().all(|c| c.id.is_some()));
        assert!(store.recent_comments("b", 5).await.unwrap().is_empty());
    }
}
