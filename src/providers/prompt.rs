use crate::model::GenerationTargets;

/// Response format appended to every recipe generation prompt.
///
/// The model is asked for a bare JSON array so the answer can be decoded
/// straight into recipe records.
pub const RECIPE_FORMAT_PROMPT: &str = r#"Return ONLY a JSON array with this structure:
[{
    "name": "Recipe Name",
    "calories": 0,
    "protein": 0,
    "carbs": 0,
    "fat": 0,
    "ingredients": ["ingredient with exact amount"],
    "instructions": ["step by step instructions"]
}]"#;

/// Prompt sent alongside a photo of food to extract its ingredients
pub const INGREDIENT_VISION_PROMPT: &str =
    "List all food items and ingredients you see. Return only a comma-separated list.";

/// Build the generation prompt for `count` recipes using `ingredients`.
pub fn build_recipe_prompt(count: usize, ingredients: &str, targets: &GenerationTargets) -> String {
    let macros = &targets.macros;
    format!(
        "Generate {count} recipes using these ingredients: {ingredients}\n\
         STRICT REQUIREMENTS:\n\
         - Each recipe MUST hit these exact macros: {} calories, {}g protein, {}g carbs, {}g fat (±5% tolerance)\n\
         - Meal type: {}\n\
         - Cuisine preference: {}\n\
         - Dietary restrictions: {}\n\
         - Must exclude: {}\n\
         - Include exact portion sizes to hit macros\n\
         {}",
        macros.calories,
        macros.protein,
        macros.carbs,
        macros.fat,
        targets.meal_type,
        targets.cuisine,
        targets.dietary,
        targets.exclude,
        RECIPE_FORMAT_PROMPT
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Macros;

    #[test]
    fn test_prompt_embeds_targets() {
        let targets = GenerationTargets {
            macros: Macros {
                calories: 650.0,
                protein: 45.0,
                carbs: 60.0,
                fat: 20.0,
            },
            meal_type: "dinner".to_string(),
            cuisine: "thai".to_string(),
            dietary: "gluten-free".to_string(),
            exclude: "peanuts".to_string(),
        };

        let prompt = build_recipe_prompt(2, "chicken, rice", &targets);
        assert!(prompt.starts_with("Generate 2 recipes using these ingredients: chicken, rice"));
        assert!(prompt.contains("650 calories, 45g protein, 60g carbs, 20g fat (±5% tolerance)"));
        assert!(prompt.contains("Meal type: dinner"));
        assert!(prompt.contains("Cuisine preference: thai"));
        assert!(prompt.contains("Dietary restrictions: gluten-free"));
        assert!(prompt.contains("Must exclude: peanuts"));
        assert!(prompt.ends_with(RECIPE_FORMAT_PROMPT));
    }

    #[test]
    fn test_vision_prompt_asks_for_comma_list() {
        assert!(INGREDIENT_VISION_PROMPT.contains("comma-separated"));
    }
}
