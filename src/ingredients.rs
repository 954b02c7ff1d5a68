/// Split free text into an ordered list of ingredient terms.
///
/// Segments are comma separated; surrounding whitespace is trimmed and empty
/// segments are dropped. Duplicates are kept in their original positions.
pub fn normalize(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether any target term occurs in the recipe's ingredient text.
///
/// Matching is a case-insensitive substring test against the space-joined
/// ingredient list, so "egg" also matches "eggplant".
pub fn matches_any(recipe_ingredients: &[String], targets: &[String]) -> bool {
    let haystack = recipe_ingredients.join(" ").to_lowercase();
    targets
        .iter()
        .any(|term| haystack.contains(&term.to_lowercase()))
}
