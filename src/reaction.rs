use crate::model::Recipe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A user's action on a recipe card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

/// Where a user currently stands on a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionState {
    Neutral,
    Liked,
    Disliked,
}

/// Counters and voter sets of one recipe
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionTally {
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
    #[serde(default)]
    pub liked_by: BTreeSet<String>,
    #[serde(default)]
    pub disliked_by: BTreeSet<String>,
}

impl ReactionTally {
    pub fn of(recipe: &Recipe) -> Self {
        Self {
            likes: recipe.likes,
            dislikes: recipe.dislikes,
            liked_by: recipe.liked_by.clone(),
            disliked_by: recipe.disliked_by.clone(),
        }
    }

    pub fn state_of(&self, user: &str) -> ReactionState {
        if self.liked_by.contains(user) {
            ReactionState::Liked
        } else if self.disliked_by.contains(user) {
            ReactionState::Disliked
        } else {
            ReactionState::Neutral
        }
    }

    /// Apply `reaction` by `user` and return the resulting tally.
    ///
    /// Repeating the current reaction withdraws it; the opposite reaction
    /// replaces it. Decrements saturate at zero even if the counters and the
    /// voter sets have drifted apart.
    pub fn apply(mut self, user: &str, reaction: Reaction) -> Self {
        let (own_count, own_set, other_count, other_set) = match reaction {
            Reaction::Like => (
                &mut self.likes,
                &mut self.liked_by,
                &mut self.dislikes,
                &mut self.disliked_by,
            ),
            Reaction::Dislike => (
                &mut self.dislikes,
                &mut self.disliked_by,
                &mut self.likes,
                &mut self.liked_by,
            ),
        };

        if own_set.remove(user) {
            *own_count = own_count.saturating_sub(1);
            return self;
        }

        *own_count += 1;
        own_set.insert(user.to_string());

        if other_set.remove(user) {
            *other_count = other_count.saturating_sub(1);
        }

        self
    }

    pub fn write_to(&self, recipe: &mut Recipe) {
        recipe.likes = self.likes;
        recipe.dislikes = self.dislikes;
        recipe.liked_by = self.liked_by.clone();
        recipe.disliked_by = self.disliked_by.clone();
    }
}
