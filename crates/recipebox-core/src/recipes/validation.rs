use std::path::PathBuf;

use thiserror::Error;

use crate::models::{Cuisine, Recipe};

/// Where a recipe image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Local file, uploaded to the image host before the recipe is saved
    File(PathBuf),
    /// Already hosted
    Url(String),
}

impl ImageSource {
    /// Interpret form input: `http(s)://` is a hosted URL, anything else a path
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Some(ImageSource::Url(trimmed.to_string()))
        } else {
            Some(ImageSource::File(PathBuf::from(trimmed)))
        }
    }

    pub fn display(&self) -> String {
        match self {
            ImageSource::File(path) => path.display().to_string(),
            ImageSource::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Ingredients,
    Type,
    Instructions,
    CookingTime,
    Image,
}

impl DraftField {
    pub const ALL: [DraftField; 6] = [
        DraftField::Title,
        DraftField::Ingredients,
        DraftField::Type,
        DraftField::Instructions,
        DraftField::CookingTime,
        DraftField::Image,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DraftField::Title => "Title",
            DraftField::Ingredients => "Ingredients",
            DraftField::Type => "Type",
            DraftField::Instructions => "Instructions",
            DraftField::CookingTime => "Cooking Time",
            DraftField::Image => "Image",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Please fill in: {}", field_labels(.missing))]
pub struct ValidationError {
    pub missing: Vec<DraftField>,
}

fn field_labels(fields: &[DraftField]) -> String {
    fields.iter().map(|f| f.label()).collect::<Vec<_>>().join(", ")
}

/// Contents of the add/edit recipe form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub cuisine: Option<Cuisine>,
    pub cooking_time: Option<u32>,
    pub image: Option<ImageSource>,
}

/// A draft with every required field present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipe {
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub cuisine: Cuisine,
    pub cooking_time: u32,
    pub image: ImageSource,
}

impl RecipeDraft {
    /// Pre-fill the edit form from an existing recipe
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            title: recipe.title.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            cuisine: Some(recipe.cuisine),
            cooking_time: Some(recipe.cooking_time),
            image: recipe
                .image
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .map(|url| ImageSource::Url(url.to_string())),
        }
    }

    /// Check every required field, reporting all missing ones together
    pub fn validate(&self) -> Result<ValidRecipe, ValidationError> {
        let mut missing = Vec::new();

        if self.title.trim().is_empty() {
            missing.push(DraftField::Title);
        }
        if self.ingredients.trim().is_empty() {
            missing.push(DraftField::Ingredients);
        }
        if self.cuisine.is_none() {
            missing.push(DraftField::Type);
        }
        if self.instructions.trim().is_empty() {
            missing.push(DraftField::Instructions);
        }
        let cooking_time = self.cooking_time.filter(|&t| t > 0);
        if cooking_time.is_none() {
            missing.push(DraftField::CookingTime);
        }
        if self.image.is_none() {
            missing.push(DraftField::Image);
        }

        match (self.cuisine, cooking_time, &self.image) {
            (Some(cuisine), Some(cooking_time), Some(image)) if missing.is_empty() => Ok(ValidRecipe {
                title: self.title.trim().to_string(),
                ingredients: self.ingredients.trim().to_string(),
                instructions: self.instructions.trim().to_string(),
                cuisine,
                cooking_time,
                image: image.clone(),
            }),
            _ => Err(ValidationError { missing }),
        }
    }
}
