use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppQuery;
use crate::models::ingredient::{IngredientResponse, IngredientSearchQuery};
use crate::services::ingredient;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/ingredients",
    tag = "Ingredients",
    operation_id = "searchIngredients",
    summary = "Search ingredients by name prefix",
    description = "Returns ingredients whose name starts with `name`, ignoring case, ordered by name. A missing or empty `name` returns an empty list.",
    params(IngredientSearchQuery),
    responses(
        (status = 200, description = "Matching ingredients", body = Vec<IngredientResponse>),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<IngredientSearchQuery>,
) -> Result<Json<Vec<IngredientResponse>>, AppError> {
    let found = ingredient::search(&state.db, query.name.as_deref()).await?;
    Ok(Json(found.into_iter().map(IngredientResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/ingredients/{id}",
    tag = "Ingredients",
    operation_id = "getIngredient",
    summary = "Get an ingredient by ID",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<IngredientResponse>, AppError> {
    let found = ingredient::find(&state.db, id).await?;
    Ok(Json(found.into()))
}
