use crate::error::{ChefError, Result};
use crate::model::{GenerationTargets, Macros, Provenance, Recipe};
use crate::providers::{build_recipe_prompt, LlmProvider};
use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Source of freshly generated recipes
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// Ask for exactly `count` recipes built from `ingredients`
    async fn generate(
        &self,
        count: usize,
        ingredients: &str,
        targets: &GenerationTargets,
    ) -> Result<Vec<Recipe>>;
}

/// The record shape the model is asked to produce
#[derive(Debug, Deserialize)]
struct GeneratedRecipe {
    name: String,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    ingredients: Vec<String>,
    instructions: Vec<String>,
}

impl From<GeneratedRecipe> for Recipe {
    fn from(generated: GeneratedRecipe) -> Self {
        Recipe {
            name: generated.name,
            macros: Macros {
                calories: generated.calories,
                protein: generated.protein,
                carbs: generated.carbs,
                fat: generated.fat,
            },
            ingredients: generated.ingredients,
            instructions: generated.instructions,
            provenance: Provenance::Generated,
            ..Default::default()
        }
    }
}

/// Generates recipes by prompting an LLM provider for a JSON array
pub struct LlmRecipeGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl LlmRecipeGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl RecipeGenerator for LlmRecipeGenerator {
    async fn generate(
        &self,
        count: usize,
        ingredients: &str,
        targets: &GenerationTargets,
    ) -> Result<Vec<Recipe>> {
        let prompt = build_recipe_prompt(count, ingredients, targets);
        debug!("Generation prompt:\n{}", prompt);

        let answer = self.provider.complete(&prompt, true).await?;
        let recipes = parse_generated_recipes(&answer)?;
        info!(
            "{} returned {} recipe(s), {} requested",
            self.provider.provider_name(),
            recipes.len(),
            count
        );
        Ok(recipes)
    }
}

/// Decode the model's answer into recipes.
///
/// Accepts a bare array, an object wrapping a single array (JSON-object
/// modes cannot return a top-level array), or a single recipe object. A
/// markdown code fence around the payload is tolerated.
pub fn parse_generated_recipes(answer: &str) -> Result<Vec<Recipe>> {
    let payload = strip_code_fence(answer);
    let value: Value = serde_json::from_str(payload)?;

    let records = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("name") => vec![Value::Object(map)],
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                ChefError::MalformedResponse("No recipe array in generated answer".to_string())
            })?,
        other => {
            return Err(ChefError::MalformedResponse(format!(
                "Expected a JSON array of recipes, got: {}",
                other
            )))
        }
    };

    records
        .into_iter()
        .map(|record| {
            serde_json::from_value::<GeneratedRecipe>(record)
                .map(Recipe::from)
                .map_err(ChefError::from)
        })
        .collect()
}

fn strip_code_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            // Drop an optional language tag on the opening fence
            let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
            body.trim_end().trim_end_matches("```").trim()
        }
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::InlineImage;
    use std::sync::Mutex;

    const ONE_RECIPE: &str = r#"[{
        "name": "Chicken Rice Bowl",
        "calories": 520,
        "protein": 42,
        "carbs": 51.5,
        "fat": 14,
        "ingredients": ["150g chicken breast", "1 cup rice"],
        "instructions": ["Cook rice", "Grill chicken"]
    }]"#;

    struct CannedProvider {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, prompt: &str, json_output: bool) -> Result<String> {
            assert!(json_output);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answer.clone())
        }

        async fn describe_image(&self, _prompt: &str, _image: &InlineImage) -> Result<String> {
            unreachable!()
        }
    }

    #[test]
    fn test_parse_array() {
        let recipes = parse_generated_recipes(ONE_RECIPE).unwrap();
        assert_eq!(recipes.len(), 1);
        let recipe = &recipes[0];
        assert_eq!(recipe.name, "Chicken Rice Bowl");
        assert_eq!(recipe.macros.carbs, 51.5);
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.provenance, Provenance::Generated);
        assert_eq!(recipe.likes, 0);
        assert!(recipe.id.is_none());
    }

    #[test]
    fn test_parse_fenced_and_wrapped() {
        let fenced = format!("```json\n{}\n```", ONE_RECIPE);
        assert_eq!(parse_generated_recipes(&fenced).unwrap().len(), 1);

        let wrapped = format!("{{\"recipes\": {}}}", ONE_RECIPE);
        assert_eq!(parse_generated_recipes(&wrapped).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_single_object() {
        let single = ONE_RECIPE.trim().trim_start_matches('[').trim_end_matches(']');
        let recipes = parse_generated_recipes(single).unwrap();
        assert_eq!(recipes[0].name, "Chicken Rice Bowl");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = parse_generated_recipes(r#"[{"name": "Mystery"}]"#).unwrap_err();
        assert!(matches!(err, ChefError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_generated_recipes("Sure! Here are your recipes").unwrap_err();
        assert!(matches!(err, ChefError::MalformedResponse(_)));

        let err = parse_generated_recipes("42").unwrap_err();
        assert!(matches!(err, ChefError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_generated_recipes("[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generator_prompts_for_count() {
        let provider = CannedProvider {
            answer: ONE_RECIPE.to_string(),
            prompts: Mutex::new(Vec::new()),
        };
        let generator = LlmRecipeGenerator::new(Arc::new(provider));

        let recipes = generator
            .generate(1, "chicken, rice", &GenerationTargets::default())
            .await
            .unwrap();
        assert_eq!(recipes.len(), 1);
    }
}
