//! Search and cuisine-tag helpers for the recipe list.

use crate::models::{Cuisine, Recipe, User};
use crate::utils::contains_ignore_case;

/// Check if a recipe matches the search term.
/// Term should already be lowercased.
fn recipe_matches_search(recipe: &Recipe, term: &str) -> bool {
    contains_ignore_case(&recipe.title, term)
        || contains_ignore_case(recipe.cuisine.display_name(), term)
}

/// Recipes whose title or cuisine contains `term`, ignoring case.
/// An empty or blank term keeps everything.
pub fn filter_recipes<'a>(recipes: &'a [Recipe], term: &str) -> Vec<&'a Recipe> {
    let term = term.trim().to_lowercase();
    recipes
        .iter()
        .filter(|r| recipe_matches_search(r, &term))
        .collect()
}

/// Distinct cuisines in the order they first appear
pub fn unique_cuisines(recipes: &[Recipe]) -> Vec<Cuisine> {
    let mut seen = Vec::new();
    for recipe in recipes {
        if !seen.contains(&recipe.cuisine) {
            seen.push(recipe.cuisine);
        }
    }
    seen
}

/// Recipes posted by `user` (the "my recipes" view)
pub fn recipes_owned_by<'a>(recipes: &[&'a Recipe], user: Option<&User>) -> Vec<&'a Recipe> {
    recipes
        .iter()
        .copied()
        .filter(|r| r.is_owned_by(user))
        .collect()
}

/// Text for the empty list state, quoting the search term as typed
pub fn empty_state_message(term: &str) -> String {
    if term.is_empty() {
        "No recipes yet.".to_string()
    } else {
        format!("No recipes found for \u{201c}{}\u{201d}.", term)
    }
}
