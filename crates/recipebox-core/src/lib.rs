//! Core library for recipebox.
//!
//! This crate holds everything the terminal client needs that is not
//! presentation:
//!
//! - `api`: HTTP client for the recipe service and the image host
//! - `auth`: token persistence and the session lifecycle
//! - `models`: `User`, `Recipe`, `Cuisine`
//! - `recipes`: the recipe repository, draft validation and list filtering
//! - `config`: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod recipes;
pub mod utils;

pub use api::{ApiClient, ApiError, ImageHost};
pub use auth::{AuthError, Session, SessionManager, SessionState};
pub use config::Config;
pub use models::{Cuisine, Recipe, User};
pub use recipes::{RecipeDraft, RecipeError, RecipeRepository, ValidationError};
