use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{PageQuery, Pagination};
use super::user::UserResponse;
use crate::entity::recipe_ingredient::{MAX_AMOUNT, MIN_AMOUNT};
use crate::error::AppError;

/// Longest accepted recipe name.
pub const MAX_NAME_LEN: usize = 200;
/// Cooking time bounds, in minutes.
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = i16::MAX as i64;

/// One requested ingredient line: catalog id plus quantity.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
pub struct IngredientAmount {
    /// Ingredient catalog ID.
    #[schema(example = 1)]
    pub id: i32,
    /// Quantity in the ingredient's unit (1-32767).
    #[schema(example = 200)]
    pub amount: i64,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientAmount>,
    /// Image reference returned by the image store.
    pub image: String,
    #[schema(example = "Pancakes")]
    pub name: String,
    pub text: String,
    /// Minutes.
    #[schema(example = 20)]
    pub cooking_time: i64,
}

/// Update payload. Scalar fields are optional; the ingredient list is
/// required and replaces the stored one entirely.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Vec<IngredientAmount>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// Check a submitted ingredient list: non-empty, no repeated ingredient,
/// every amount within `[MIN_AMOUNT, MAX_AMOUNT]`.
pub fn validate_ingredient_set(items: &[IngredientAmount]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::field(
            "ingredients",
            "At least one ingredient is required",
        ));
    }
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id) {
            return Err(AppError::field(
                "ingredients",
                format!("Ingredient {} is listed more than once", item.id),
            ));
        }
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&item.amount) {
            return Err(AppError::field(
                "amount",
                format!("Amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}"),
            ));
        }
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::field(
            "name",
            format!("Name must be 1-{MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::field("text", "Description must not be empty"));
    }
    Ok(())
}

fn validate_cooking_time(minutes: i64) -> Result<(), AppError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&minutes) {
        return Err(AppError::field(
            "cooking_time",
            format!("Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"),
        ));
    }
    Ok(())
}

fn validate_image(image: &str) -> Result<(), AppError> {
    if image.trim().is_empty() {
        return Err(AppError::field("image", "Image must not be empty"));
    }
    Ok(())
}

pub fn validate_create_recipe(payload: &CreateRecipeRequest) -> Result<(), AppError> {
    validate_ingredient_set(&payload.ingredients)?;
    validate_name(&payload.name)?;
    validate_text(&payload.text)?;
    validate_cooking_time(payload.cooking_time)?;
    validate_image(&payload.image)
}

pub fn validate_update_recipe(payload: &UpdateRecipeRequest) -> Result<(), AppError> {
    validate_ingredient_set(&payload.ingredients)?;
    if let Some(ref name) = payload.name {
        validate_name(name)?;
    }
    if let Some(ref text) = payload.text {
        validate_text(text)?;
    }
    if let Some(minutes) = payload.cooking_time {
        validate_cooking_time(minutes)?;
    }
    if let Some(ref image) = payload.image {
        validate_image(image)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient catalog ID.
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i16,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

/// Compact recipe form used by favorites, the cart and subscriptions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub struct RecipeShortResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<crate::entity::recipe::Model> for RecipeShortResponse {
    fn from(m: crate::entity::recipe::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            image: m.image,
            cooking_time: m.cooking_time,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeListResponse {
    pub data: Vec<RecipeResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RecipeLinkResponse {
    #[serde(rename = "short-link")]
    #[schema(example = "http://localhost:8000/recipes/3")]
    pub short_link: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RecipeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only recipes by this author.
    pub author: Option<i32>,
    /// `1` to show only the caller's favorites.
    pub is_favorited: Option<u8>,
    /// `1` to show only recipes in the caller's shopping cart.
    pub is_in_shopping_cart: Option<u8>,
}

impl RecipeListQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}
