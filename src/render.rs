//! Plain-text rendering of recipe cards and comment threads.

use crate::auth::short_user_id;
use crate::model::{Comment, Provenance, Recipe};
use std::fmt::Write;

pub const EMPTY_RECIPES: &str = "No recipes found";
pub const EMPTY_COMMENTS: &str = "No comments yet. Be the first!";

fn badge(provenance: Provenance) -> Option<&'static str> {
    match provenance {
        Provenance::Community => Some("Community Favorite"),
        Provenance::Saved => Some("Saved"),
        Provenance::Generated => None,
    }
}

pub fn render_recipe(recipe: &Recipe) -> String {
    let mut out = String::new();

    if let Some(badge) = badge(recipe.provenance) {
        let _ = writeln!(out, "[{}]", badge);
    }
    let _ = writeln!(out, "{}", recipe.name);
    if let Some(id) = &recipe.id {
        let _ = writeln!(out, "id: {}", id);
    }
    let _ = writeln!(
        out,
        "Calories: {:.0} | Protein: {:.0}g | Carbs: {:.0}g | Fat: {:.0}g",
        recipe.macros.calories, recipe.macros.protein, recipe.macros.carbs, recipe.macros.fat
    );
    let _ = writeln!(out, "Likes: {}  Dislikes: {}", recipe.likes, recipe.dislikes);

    out.push_str("\nIngredients:\n");
    for ingredient in &recipe.ingredients {
        let _ = writeln!(out, "  - {}", ingredient);
    }

    out.push_str("\nInstructions:\n");
    for (i, step) in recipe.instructions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }

    if let Some(video) = &recipe.video_url {
        let _ = writeln!(out, "\nVideo: {}", video);
    }
    out
}

/// All cards separated by a blank line, or the empty-state message
pub fn render_recipes(recipes: &[Recipe]) -> String {
    if recipes.is_empty() {
        return format!("{}\n", EMPTY_RECIPES);
    }
    recipes
        .iter()
        .map(render_recipe)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_comment(comment: &Comment) -> String {
    format!(
        "User {}: {} ({})",
        short_user_id(&comment.author),
        comment.text,
        comment.created_at.format("%Y-%m-%d")
    )
}

pub fn render_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return format!("{}\n", EMPTY_COMMENTS);
    }
    comments
        .iter()
        .map(|c| render_comment(c) + "\n")
        .collect()
}
