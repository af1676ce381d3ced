use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::recipe::{
    CreateRecipeRequest, RecipeLinkResponse, RecipeListQuery, RecipeListResponse, RecipeResponse,
    RecipeShortResponse, UpdateRecipeRequest,
};
use crate::services::collection::RecipeCollection;
use crate::services::recipe::{self as recipes, RecipeFilter, RecipeService};
use crate::services::shopping_list;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/recipes",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List recipes",
    description = "Newest recipes first. `author` narrows to one author. `is_favorited=1` and `is_in_shopping_cart=1` narrow to the caller's favorites or cart and are ignored for anonymous requests.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "List of recipes", body = RecipeListResponse),
        (status = 400, description = "Malformed query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_recipes(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RecipeListQuery>,
) -> Result<Json<RecipeListResponse>, AppError> {
    let viewer = auth_user.map(|u| u.user_id);
    let filter = RecipeFilter {
        author: query.author,
        favorited_by: viewer.filter(|_| query.is_favorited == Some(1)),
        in_cart_of: viewer.filter(|_| query.is_in_shopping_cart == Some(1)),
    };

    let page = query.page();
    let (rows, total) = RecipeService::new(&state.db).list(filter, page).await?;
    let data = recipes::present(&state.db, viewer, rows).await?;

    Ok(Json(RecipeListResponse {
        data,
        pagination: page.pagination(total),
    }))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe by ID",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_recipe(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = recipes::find_recipe(&state.db, id).await?;
    let body = recipes::present_one(&state.db, auth_user.map(|u| u.user_id), recipe).await?;
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/recipes",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe owned by the caller. Every ingredient must exist, appear once, and have an amount between 1 and 32767.",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Caller already has a recipe with this name (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, name = %payload.name))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = RecipeService::new(&state.db)
        .create(auth_user.user_id, payload)
        .await?;
    let body = recipes::present_one(&state.db, Some(auth_user.user_id), recipe).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    patch,
    path = "/recipes/{id}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Update a recipe",
    description = "Only provided scalar fields are changed. `ingredients` is required and replaces the stored ingredient list entirely. Only the author or an admin may update.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name clashes with another of the author's recipes (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let recipe = RecipeService::new(&state.db)
        .update(&auth_user, id, payload)
        .await?;
    let body = recipes::present_one(&state.db, Some(auth_user.user_id), recipe).await?;
    Ok(Json(body))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes the recipe together with its ingredient list and every favorite and cart entry pointing at it. Only the author or an admin may delete.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    RecipeService::new(&state.db).delete(&auth_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/favorite",
    tag = "Favorites",
    operation_id = "addFavorite",
    summary = "Add a recipe to favorites",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already in favorites (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn add_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = RecipeCollection::Favorites
        .add(&state.db, auth_user.user_id, id)
        .await?;
    Ok((StatusCode::CREATED, Json(RecipeShortResponse::from(recipe))))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/favorite",
    tag = "Favorites",
    operation_id = "removeFavorite",
    summary = "Remove a recipe from favorites",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found or not a favorite (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn remove_favorite(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    RecipeCollection::Favorites
        .remove(&state.db, auth_user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/shopping_cart",
    tag = "Shopping Cart",
    operation_id = "addToShoppingCart",
    summary = "Add a recipe to the shopping cart",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to the cart", body = RecipeShortResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already in the cart (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn add_to_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = RecipeCollection::ShoppingCart
        .add(&state.db, auth_user.user_id, id)
        .await?;
    Ok((StatusCode::CREATED, Json(RecipeShortResponse::from(recipe))))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/shopping_cart",
    tag = "Shopping Cart",
    operation_id = "removeFromShoppingCart",
    summary = "Remove a recipe from the shopping cart",
    description = "Only the caller's own cart entry is removed.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from the cart"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found or not in the cart (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn remove_from_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    RecipeCollection::ShoppingCart
        .remove(&state.db, auth_user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/recipes/{id}/get-link",
    tag = "Recipes",
    operation_id = "getRecipeLink",
    summary = "Get a shareable link to a recipe",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe link", body = RecipeLinkResponse),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeLinkResponse>, AppError> {
    let recipe = recipes::find_recipe(&state.db, id).await?;
    let base = state.config.server.public_url.trim_end_matches('/');
    Ok(Json(RecipeLinkResponse {
        short_link: format!("{}/recipes/{}", base, recipe.id),
    }))
}

#[utoipa::path(
    get,
    path = "/recipes/download_shopping_cart",
    tag = "Shopping Cart",
    operation_id = "downloadShoppingCart",
    summary = "Download the shopping list",
    description = "Plain-text list of every ingredient across the caller's cart, summed per ingredient and unit and sorted by name. An empty cart yields only the header and signature.",
    responses(
        (status = 200, description = "Shopping list file", content_type = "text/plain", body = String),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn download_shopping_cart(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let items = shopping_list::collect(&state.db, auth_user.user_id).await?;
    let body = shopping_list::render(&items, Utc::now().date_naive());

    tracing::info!(lines = items.len(), "Shopping list generated");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", shopping_list::FILE_NAME),
            ),
        ],
        body,
    ))
}
