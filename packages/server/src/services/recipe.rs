use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::*;

use crate::entity::{favorite, ingredient, recipe, recipe_ingredient, shopping_cart, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::models::recipe::{
    CreateRecipeRequest, IngredientAmount, RecipeIngredientResponse, RecipeResponse,
    UpdateRecipeRequest, validate_create_recipe, validate_update_recipe,
};
use crate::models::shared::PageQuery;
use crate::models::user::UserResponse;
use crate::services::collection::RecipeCollection;
use crate::services::follow;

/// Filters accepted by the recipe listing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    /// Only recipes this user favorited.
    pub favorited_by: Option<i32>,
    /// Only recipes in this user's shopping cart.
    pub in_cart_of: Option<i32>,
}

pub struct RecipeService<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> RecipeService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Create a recipe owned by `author_id` together with its ingredient set.
    pub async fn create(
        &self,
        author_id: i32,
        payload: CreateRecipeRequest,
    ) -> Result<recipe::Model, AppError> {
        validate_create_recipe(&payload)?;

        let txn = self.conn.begin().await?;
        ensure_ingredients_exist(&txn, &payload.ingredients).await?;

        let new_recipe = recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(payload.name.trim().to_string()),
            text: Set(payload.text),
            cooking_time: Set(payload.cooking_time as i32),
            image: Set(payload.image),
            pub_date: Set(Utc::now()),
            ..Default::default()
        };
        let model = new_recipe.insert(&txn).await.map_err(name_conflict)?;

        replace_ingredients(&txn, model.id, &payload.ingredients).await?;
        txn.commit().await?;

        tracing::info!(recipe_id = model.id, author_id, "Recipe created");
        Ok(model)
    }

    /// Update a recipe. The stored ingredient set is replaced by the
    /// submitted one; ingredients left out are dropped.
    pub async fn update(
        &self,
        caller: &AuthUser,
        recipe_id: i32,
        payload: UpdateRecipeRequest,
    ) -> Result<recipe::Model, AppError> {
        let txn = self.conn.begin().await?;
        let existing = find_recipe_for_update(&txn, recipe_id).await?;
        caller.require_owner_or_admin(existing.author_id)?;
        validate_update_recipe(&payload)?;
        ensure_ingredients_exist(&txn, &payload.ingredients).await?;

        let unchanged = payload.name.is_none()
            && payload.text.is_none()
            && payload.cooking_time.is_none()
            && payload.image.is_none();

        let model = if unchanged {
            existing
        } else {
            let mut active: recipe::ActiveModel = existing.into();
            if let Some(ref name) = payload.name {
                active.name = Set(name.trim().to_string());
            }
            if let Some(text) = payload.text {
                active.text = Set(text);
            }
            if let Some(minutes) = payload.cooking_time {
                active.cooking_time = Set(minutes as i32);
            }
            if let Some(image) = payload.image {
                active.image = Set(image);
            }
            active.update(&txn).await.map_err(name_conflict)?
        };

        replace_ingredients(&txn, recipe_id, &payload.ingredients).await?;
        txn.commit().await?;

        tracing::info!(recipe_id, user_id = caller.user_id, "Recipe updated");
        Ok(model)
    }

    /// Delete a recipe with its ingredient lines, favorites and cart entries.
    pub async fn delete(&self, caller: &AuthUser, recipe_id: i32) -> Result<(), AppError> {
        let txn = self.conn.begin().await?;
        let existing = find_recipe_for_update(&txn, recipe_id).await?;
        caller.require_owner_or_admin(existing.author_id)?;

        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        favorite::Entity::delete_many()
            .filter(favorite::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        shopping_cart::Entity::delete_many()
            .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
            .exec(&txn)
            .await?;
        recipe::Entity::delete_by_id(recipe_id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(recipe_id, user_id = caller.user_id, "Recipe deleted");
        Ok(())
    }

    /// One page of recipes, newest first, plus the total match count.
    pub async fn list(
        &self,
        filter: RecipeFilter,
        page: PageQuery,
    ) -> Result<(Vec<recipe::Model>, u64), AppError> {
        let mut select = recipe::Entity::find();

        if let Some(author) = filter.author {
            select = select.filter(recipe::Column::AuthorId.eq(author));
        }
        if let Some(user_id) = filter.favorited_by {
            select = select.filter(
                recipe::Column::Id.in_subquery(RecipeCollection::Favorites.recipe_ids_of(user_id)),
            );
        }
        if let Some(user_id) = filter.in_cart_of {
            select = select.filter(
                recipe::Column::Id
                    .in_subquery(RecipeCollection::ShoppingCart.recipe_ids_of(user_id)),
            );
        }

        let (_, limit) = page.window();
        let total = select.clone().paginate(self.conn, limit).num_items().await?;

        let data = select
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .offset(Some(page.offset()))
            .limit(Some(limit))
            .all(self.conn)
            .await?;

        Ok((data, total))
    }
}

/// Look up a recipe by ID, returning 404 if not found.
pub async fn find_recipe<C: ConnectionTrait>(db: &C, id: i32) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

async fn find_recipe_for_update<C: ConnectionTrait>(
    txn: &C,
    id: i32,
) -> Result<recipe::Model, AppError> {
    recipe::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".into()))
}

fn name_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("You already have a recipe with this name".into())
        }
        _ => AppError::from(err),
    }
}

async fn ensure_ingredients_exist<C: ConnectionTrait>(
    db: &C,
    items: &[IngredientAmount],
) -> Result<(), AppError> {
    let ids: Vec<i32> = items.iter().map(|item| item.id).collect();
    let found: HashSet<i32> = ingredient::Entity::find()
        .filter(ingredient::Column::Id.is_in(ids.clone()))
        .select_only()
        .column(ingredient::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(AppError::field(
            "ingredients",
            format!("Ingredient {missing} does not exist"),
        )),
        None => Ok(()),
    }
}

/// Replace the recipe's ingredient lines with `items`.
///
/// Must run inside the caller's transaction so readers never observe the
/// cleared-but-not-rebuilt state.
pub async fn replace_ingredients<C: ConnectionTrait>(
    db: &C,
    recipe_id: i32,
    items: &[IngredientAmount],
) -> Result<(), AppError> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;

    for item in items {
        let amount = i16::try_from(item.amount)
            .map_err(|_| AppError::field("amount", "Amount is out of range"))?;
        let line = recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(item.id),
            amount: Set(amount),
        };
        recipe_ingredient::Entity::insert(line)
            .on_conflict(
                OnConflict::columns([
                    recipe_ingredient::Column::RecipeId,
                    recipe_ingredient::Column::IngredientId,
                ])
                .update_column(recipe_ingredient::Column::Amount)
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

#[derive(Debug, FromQueryResult)]
struct IngredientLine {
    recipe_id: i32,
    ingredient_id: i32,
    name: String,
    measurement_unit: String,
    amount: i16,
}

/// Ingredient lines of the given recipes, keyed by recipe ID.
pub async fn ingredient_lines<C: ConnectionTrait>(
    db: &C,
    recipe_ids: &[i32],
) -> Result<HashMap<i32, Vec<RecipeIngredientResponse>>, DbErr> {
    let mut by_recipe: HashMap<i32, Vec<RecipeIngredientResponse>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(by_recipe);
    }

    let lines = recipe_ingredient::Entity::find()
        .select_only()
        .column(recipe_ingredient::Column::RecipeId)
        .column(recipe_ingredient::Column::IngredientId)
        .column(recipe_ingredient::Column::Amount)
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.to_vec()))
        .order_by_asc(ingredient::Column::Name)
        .into_model::<IngredientLine>()
        .all(db)
        .await?;

    for line in lines {
        by_recipe
            .entry(line.recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id: line.ingredient_id,
                name: line.name,
                measurement_unit: line.measurement_unit,
                amount: line.amount,
            });
    }
    Ok(by_recipe)
}

/// Build full recipe representations as seen by `viewer`.
///
/// Membership flags and `is_subscribed` are computed for the viewer only and
/// are false for anonymous callers.
pub async fn present<C: ConnectionTrait>(
    db: &C,
    viewer: Option<i32>,
    recipes: Vec<recipe::Model>,
) -> Result<Vec<RecipeResponse>, AppError> {
    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<i32> = recipes
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<i32, user::Model> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(author_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    let mut lines = ingredient_lines(db, &recipe_ids).await?;

    let (subscribed, favorited, in_cart) = match viewer {
        Some(user_id) => (
            follow::followed_among(db, user_id, &author_ids).await?,
            RecipeCollection::Favorites
                .members_among(db, user_id, &recipe_ids)
                .await?,
            RecipeCollection::ShoppingCart
                .members_among(db, user_id, &recipe_ids)
                .await?,
        ),
        None => Default::default(),
    };

    recipes
        .into_iter()
        .map(|r| -> Result<RecipeResponse, AppError> {
            let author = authors.get(&r.author_id).cloned().ok_or_else(|| {
                AppError::Internal(format!("Author {} of recipe {} missing", r.author_id, r.id))
            })?;
            Ok(RecipeResponse {
                id: r.id,
                author: UserResponse::new(author, subscribed.contains(&r.author_id)),
                ingredients: lines.remove(&r.id).unwrap_or_default(),
                is_favorited: favorited.contains(&r.id),
                is_in_shopping_cart: in_cart.contains(&r.id),
                name: r.name,
                image: r.image,
                text: r.text,
                cooking_time: r.cooking_time,
                pub_date: r.pub_date,
            })
        })
        .collect()
}

/// Single-recipe convenience wrapper around [`present`].
pub async fn present_one<C: ConnectionTrait>(
    db: &C,
    viewer: Option<i32>,
    recipe: recipe::Model,
) -> Result<RecipeResponse, AppError> {
    present(db, viewer, vec![recipe])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Recipe representation missing".into()))
}
