//! Recipe CRUD against the recipe service.
//!
//! Every call is one request/response cycle carrying the bearer token of
//! the `ApiClient` the repository was built with. Create and update push
//! local images to the image host first; a failed upload stops the
//! operation before the recipe service is contacted.

use reqwest::Method;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::client::Envelope;
use crate::api::{ApiClient, ApiError, ImageError, ImageHost};
use crate::models::Recipe;

use super::validation::{ImageSource, RecipeDraft, ValidRecipe, ValidationError};

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Upload(#[from] ImageError),

    #[error("{0}")]
    Api(#[from] ApiError),
}

impl RecipeError {
    /// Message suitable for a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            RecipeError::Validation(e) => e.to_string(),
            RecipeError::Upload(ImageError::Upload(e)) => {
                format!("Image upload failed: {}", e.user_message())
            }
            RecipeError::Upload(e) => e.to_string(),
            RecipeError::Api(e) => e.user_message(),
        }
    }
}

/// Request body for create and update
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecipePayload<'a> {
    title: &'a str,
    ingredients: &'a str,
    instructions: &'a str,
    #[serde(rename = "type")]
    cuisine: &'static str,
    cooking_time: u32,
    image: &'a str,
}

#[derive(Clone)]
pub struct RecipeRepository {
    api: ApiClient,
    images: ImageHost,
}

impl RecipeRepository {
    pub fn new(api: ApiClient, images: ImageHost) -> Self {
        Self { api, images }
    }

    /// Same repository talking through a different client (after login/logout)
    pub fn with_client(&self, api: ApiClient) -> Self {
        Self {
            api,
            images: self.images.clone(),
        }
    }

    /// Fetch every recipe. Entries that do not parse are skipped.
    pub async fn list(&self) -> Result<Vec<Recipe>, RecipeError> {
        let envelope: Envelope<Vec<serde_json::Value>> =
            self.api.get("/Recipes/getAllRecipes").await?;

        let raw = envelope.data.unwrap_or_default();
        let total = raw.len();
        let recipes: Vec<Recipe> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Recipe>(value) {
                Ok(recipe) => Some(recipe),
                Err(e) => {
                    warn!(error = %e, "Skipping recipe that failed to parse");
                    None
                }
            })
            .collect();

        debug!(total = total, parsed = recipes.len(), "Fetched recipes");
        Ok(recipes)
    }

    /// Validate, upload the image, then create the recipe.
    /// Returns the created recipe when the service echoes it back.
    pub async fn create(&self, draft: &RecipeDraft) -> Result<Option<Recipe>, RecipeError> {
        let valid = draft.validate()?;
        let image_url = self.resolve_image(&valid.image).await?;

        let recipe = self
            .save(Method::POST, "/Recipes".to_string(), &valid, &image_url)
            .await?;
        info!(title = %valid.title, "Recipe created");
        Ok(recipe)
    }

    /// Validate and update an existing recipe. A hosted image URL is sent
    /// unchanged; a local file is uploaded first.
    pub async fn update(&self, id: &str, draft: &RecipeDraft) -> Result<Option<Recipe>, RecipeError> {
        let valid = draft.validate()?;
        let image_url = self.resolve_image(&valid.image).await?;

        let recipe = self
            .save(Method::PUT, format!("/Recipes/update/{}", id), &valid, &image_url)
            .await?;
        info!(id = id, "Recipe updated");
        Ok(recipe)
    }

    /// Delete a recipe, returning the server's status message
    pub async fn delete(&self, id: &str) -> Result<String, RecipeError> {
        let envelope: Envelope<serde_json::Value> = self
            .api
            .send::<_, ()>(Method::DELETE, &format!("/Recipes/delete/{}", id), None)
            .await?;

        info!(id = id, "Recipe deleted");
        Ok(envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Recipe deleted".to_string()))
    }

    async fn resolve_image(&self, image: &ImageSource) -> Result<String, ImageError> {
        match image {
            ImageSource::Url(url) => Ok(url.clone()),
            ImageSource::File(path) => self.images.upload(path).await,
        }
    }

    async fn save(
        &self,
        method: Method,
        path: String,
        valid: &ValidRecipe,
        image_url: &str,
    ) -> Result<Option<Recipe>, ApiError> {
        let payload = RecipePayload {
            title: &valid.title,
            ingredients: &valid.ingredients,
            instructions: &valid.instructions,
            cuisine: valid.cuisine.as_wire(),
            cooking_time: valid.cooking_time,
            image: image_url,
        };

        let envelope: Envelope<serde_json::Value> =
            self.api.send(method, &path, Some(&payload)).await?;

        // The echoed recipe is informational; callers refresh the list anyway
        Ok(envelope
            .data
            .and_then(|value| serde_json::from_value::<Recipe>(value).ok()))
    }
}
