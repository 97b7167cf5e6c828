//! Data models for recipe service entities.
//!
//! - `User`: the account behind a session or a recipe's author
//! - `Recipe`, `Creator`: a dish and a reference to whoever posted it
//! - `Cuisine`: the closed set of recipe types the service accepts

pub mod recipe;
pub mod user;

pub use recipe::{Creator, Cuisine, Recipe, COOKING_TIME_PRESETS};
pub use user::User;
