//! Recipe operations against the recipe service.
//!
//! - `repository`: list/create/update/delete, with the image upload step
//! - `validation`: client-side checks on form drafts before anything is sent
//! - `filter`: search and cuisine-tag helpers for the recipe list

pub mod filter;
pub mod repository;
pub mod validation;

pub use filter::{empty_state_message, filter_recipes, recipes_owned_by, unique_cuisines};
pub use repository::{RecipeError, RecipeRepository};
pub use validation::{DraftField, ImageSource, RecipeDraft, ValidRecipe, ValidationError};
