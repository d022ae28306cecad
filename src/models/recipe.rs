use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};

/// Minimum ingredients required before any network call is attempted.
pub const MIN_INGREDIENTS: usize = 3;
/// Maximum ingredients accepted; the UI caps input but the core rejects too.
pub const MAX_INGREDIENTS: usize = 10;

/// Fallback match percentage when the upstream omits one.
pub const FALLBACK_MATCH_PERCENTAGE: u8 = 75;

/// Recipe difficulty filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Any,
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Any => "Any",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(s)
    }
}

/// Generation filters supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFilters {
    /// Dietary tags (e.g. "vegetarian", "gluten-free").
    #[serde(default)]
    pub dietary: Vec<String>,
    /// Optional cuisine preference.
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Maximum cooking time in minutes.
    #[serde(default = "default_cooking_time")]
    pub cooking_time: u32,
    /// Difficulty ceiling.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Optional calorie cap per serving.
    #[serde(default)]
    pub max_calories: Option<u32>,
}

fn default_cooking_time() -> u32 {
    60
}

impl Default for RecipeFilters {
    fn default() -> Self {
        Self {
            dietary: Vec::new(),
            cuisine: None,
            cooking_time: default_cooking_time(),
            difficulty: Difficulty::Any,
            max_calories: None,
        }
    }
}

/// The normalized input to recipe generation.
#[derive(Debug, Clone)]
pub struct RecipeRequest {
    /// Deduplicated, lowercased ingredient names in input order.
    pub ingredients: Vec<String>,
    /// Generation filters.
    pub filters: RecipeFilters,
}

impl RecipeRequest {
    /// Builds a request, normalizing the ingredient list: names are trimmed
    /// and lowercased, duplicates removed, input order preserved.
    pub fn new(ingredients: Vec<String>, filters: RecipeFilters) -> Self {
        let mut seen = Vec::new();
        for raw in ingredients {
            let name = raw.trim().to_lowercase();
            if !name.is_empty() && !seen.contains(&name) {
                seen.push(name);
            }
        }

        Self {
            ingredients: seen,
            filters,
        }
    }

    /// Enforces the 3..=10 ingredient bounds.
    pub fn validate(&self) -> Result<()> {
        if self.ingredients.len() < MIN_INGREDIENTS {
            return Err(AppError::Validation(
                "Please add at least 3 ingredients to generate recipes.".to_string(),
            ));
        }
        if self.ingredients.len() > MAX_INGREDIENTS {
            return Err(AppError::Validation(
                "At most 10 ingredients are supported.".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the compact, token-efficient generation prompt.
    pub fn prompt(&self) -> String {
        let mut filter_parts = Vec::new();
        if !self.filters.dietary.is_empty() {
            filter_parts.push(format!("diet:{}", self.filters.dietary.join(",")));
        }
        if let Some(cuisine) = &self.filters.cuisine {
            filter_parts.push(format!("cuisine:{}", cuisine));
        }
        if self.filters.cooking_time != default_cooking_time() {
            filter_parts.push(format!("time:<{}min", self.filters.cooking_time));
        }
        if self.filters.difficulty != Difficulty::Any {
            filter_parts.push(format!("level:{}", self.filters.difficulty));
        }
        if let Some(cap) = self.filters.max_calories {
            filter_parts.push(format!("cal:<{}", cap));
        }

        let filter_str = if filter_parts.is_empty() {
            String::new()
        } else {
            format!("\nFilters: {}", filter_parts.join(" | "))
        };

        format!(
            "Generate 3 recipes using: {}{}\n\n\
             Return JSON array. Each recipe: {{id,name,description,cookingTime,difficulty,\
             servings,calories,cuisine,dietaryTags[],matchPercentage,\
             ingredients[{{name,amount,userHas}}],instructions[],\
             nutritionalInfo:{{protein,carbs,fat,fiber}},tips}}\n\n\
             JSON only, no markdown.",
            self.ingredients.join(", "),
            filter_str
        )
    }
}

/// One ingredient line inside a generated recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: String,
    /// Whether the ingredient was in the user's input list.
    #[serde(default)]
    pub user_has: bool,
}

/// Macro-nutrient summary for a recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    #[serde(default)]
    pub protein: String,
    #[serde(default)]
    pub carbs: String,
    #[serde(default)]
    pub fat: String,
    #[serde(default)]
    pub fiber: String,
}

/// A parsed recipe record from the generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecipe {
    /// Unique id; backfilled by the normalizer if the upstream omits it.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cooking_time: u32,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub servings: u32,
    #[serde(default)]
    pub calories: u32,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    /// How well the recipe matches the supplied ingredients.
    #[serde(default = "default_match_percentage")]
    pub match_percentage: u8,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub nutritional_info: NutritionFacts,
    #[serde(default)]
    pub tips: Option<String>,
}

fn default_match_percentage() -> u8 {
    FALLBACK_MATCH_PERCENTAGE
}
