use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::User;

/// Cooking times offered by the recipe form, in minutes
pub const COOKING_TIME_PRESETS: [u32; 5] = [15, 20, 30, 45, 60];

/// Shown on a recipe card when the recipe has no hosted image
pub const PLACEHOLDER_IMAGE: &str = "(no image)";

/// Recipe type. The service stores these as uppercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cuisine {
    American,
    Thai,
    Italian,
    Asian,
    Mexican,
    French,
    Indian,
    Chinese,
    Japanese,
}

impl Cuisine {
    pub const ALL: [Cuisine; 9] = [
        Cuisine::American,
        Cuisine::Thai,
        Cuisine::Italian,
        Cuisine::Asian,
        Cuisine::Mexican,
        Cuisine::French,
        Cuisine::Indian,
        Cuisine::Chinese,
        Cuisine::Japanese,
    ];

    /// Wire representation, e.g. `ITALIAN`
    pub fn as_wire(&self) -> &'static str {
        match self {
            Cuisine::American => "AMERICAN",
            Cuisine::Thai => "THAI",
            Cuisine::Italian => "ITALIAN",
            Cuisine::Asian => "ASIAN",
            Cuisine::Mexican => "MEXICAN",
            Cuisine::French => "FRENCH",
            Cuisine::Indian => "INDIAN",
            Cuisine::Chinese => "CHINESE",
            Cuisine::Japanese => "JAPANESE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Cuisine::American => "American",
            Cuisine::Thai => "Thai",
            Cuisine::Italian => "Italian",
            Cuisine::Asian => "Asian",
            Cuisine::Mexican => "Mexican",
            Cuisine::French => "French",
            Cuisine::Indian => "Indian",
            Cuisine::Chinese => "Chinese",
            Cuisine::Japanese => "Japanese",
        }
    }

    /// Next cuisine in form order, `None` wraps to the first
    pub fn cycle(current: Option<Cuisine>) -> Cuisine {
        match current {
            None => Cuisine::ALL[0],
            Some(c) => {
                let idx = Cuisine::ALL.iter().position(|x| *x == c).unwrap_or(0);
                Cuisine::ALL[(idx + 1) % Cuisine::ALL.len()]
            }
        }
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown recipe type '{0}'")]
pub struct UnknownCuisine(pub String);

impl FromStr for Cuisine {
    type Err = UnknownCuisine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Cuisine::ALL
            .iter()
            .copied()
            .find(|c| c.as_wire().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCuisine(s.to_string()))
    }
}

impl TryFrom<String> for Cuisine {
    type Error = UnknownCuisine;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cuisine> for String {
    fn from(value: Cuisine) -> Self {
        value.as_wire().to_string()
    }
}

/// Author of a recipe. The list endpoint populates it, mutations may
/// return only the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Creator {
    User {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
    Id(String),
}

impl Creator {
    pub fn id(&self) -> &str {
        match self {
            Creator::User { id, .. } => id,
            Creator::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Creator::User { name, .. } => name.as_deref().filter(|n| !n.is_empty()),
            Creator::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(rename = "type", alias = "cuisine")]
    pub cuisine: Cuisine,
    #[serde(rename = "cookingTime")]
    pub cooking_time: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "createdBy", default)]
    pub created_by: Option<Creator>,
}

impl Recipe {
    /// Whether `viewer` posted this recipe. Only owners get edit/delete.
    pub fn is_owned_by(&self, viewer: Option<&User>) -> bool {
        match (viewer, &self.created_by) {
            (Some(user), Some(creator)) => creator.id() == user.id,
            _ => false,
        }
    }

    /// "By:" label for the recipe card
    pub fn author_label(&self, viewer: Option<&User>) -> String {
        if self.is_owned_by(viewer) {
            return "You".to_string();
        }
        self.created_by
            .as_ref()
            .and_then(|c| c.name())
            .unwrap_or("Unknown")
            .to_string()
    }

    pub fn cooking_time_display(&self) -> String {
        format!("{} mins", self.cooking_time)
    }

    pub fn image_display(&self) -> &str {
        self.image
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }
}
