//! Per-user recipe collections: favorites and the shopping cart.
//!
//! Each (user, recipe) pair is either absent or present. `add` moves it to
//! present and fails if it already was, `remove` moves it back and fails if
//! it was absent. The composite primary key of each table is what actually
//! prevents duplicates; the existence check only picks the error message.

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::{Query as SeaQuery, SelectStatement};
use sea_orm::*;

use crate::entity::{favorite, recipe, shopping_cart};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    fn already_present(self) -> AppError {
        match self {
            RecipeCollection::Favorites => {
                AppError::Conflict("Recipe is already in favorites".into())
            }
            RecipeCollection::ShoppingCart => {
                AppError::Conflict("Recipe is already in the shopping cart".into())
            }
        }
    }

    fn absent(self) -> AppError {
        match self {
            RecipeCollection::Favorites => AppError::NotFound("Recipe is not in favorites".into()),
            RecipeCollection::ShoppingCart => {
                AppError::NotFound("Recipe is not in the shopping cart".into())
            }
        }
    }

    /// Whether the pair is currently present.
    pub async fn contains<C: ConnectionTrait>(
        self,
        db: &C,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool, DbErr> {
        let found = match self {
            RecipeCollection::Favorites => favorite::Entity::find_by_id((user_id, recipe_id))
                .one(db)
                .await?
                .is_some(),
            RecipeCollection::ShoppingCart => {
                shopping_cart::Entity::find_by_id((user_id, recipe_id))
                    .one(db)
                    .await?
                    .is_some()
            }
        };
        Ok(found)
    }

    /// Add a recipe to the user's collection and return the recipe.
    pub async fn add<C: ConnectionTrait + TransactionTrait>(
        self,
        db: &C,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<recipe::Model, AppError> {
        let txn = db.begin().await?;
        let recipe = recipe::Entity::find_by_id(recipe_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipe not found".into()))?;

        if self.contains(&txn, user_id, recipe_id).await? {
            return Err(self.already_present());
        }

        let now = Utc::now();
        let inserted = match self {
            RecipeCollection::Favorites => favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                added_at: Set(now),
            }
            .insert(&txn)
            .await
            .map(|_| ()),
            RecipeCollection::ShoppingCart => shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                added_at: Set(now),
            }
            .insert(&txn)
            .await
            .map(|_| ()),
        };

        match inserted {
            Ok(()) => {
                txn.commit().await?;
                tracing::info!(user_id, recipe_id, collection = ?self, "Recipe added");
                Ok(recipe)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!("Collection race condition: unique constraint caught on insert");
                Err(self.already_present())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a recipe from this user's collection only.
    pub async fn remove<C: ConnectionTrait + TransactionTrait>(
        self,
        db: &C,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<(), AppError> {
        let txn = db.begin().await?;
        recipe::Entity::find_by_id(recipe_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipe not found".into()))?;

        let result = match self {
            RecipeCollection::Favorites => {
                favorite::Entity::delete_by_id((user_id, recipe_id))
                    .exec(&txn)
                    .await?
            }
            RecipeCollection::ShoppingCart => {
                shopping_cart::Entity::delete_by_id((user_id, recipe_id))
                    .exec(&txn)
                    .await?
            }
        };
        if result.rows_affected == 0 {
            return Err(self.absent());
        }

        txn.commit().await?;
        tracing::info!(user_id, recipe_id, collection = ?self, "Recipe removed");
        Ok(())
    }

    /// Subquery selecting the recipe IDs in the user's collection.
    pub fn recipe_ids_of(self, user_id: i32) -> SelectStatement {
        match self {
            RecipeCollection::Favorites => SeaQuery::select()
                .column(favorite::Column::RecipeId)
                .from(favorite::Entity)
                .and_where(favorite::Column::UserId.eq(user_id))
                .to_owned(),
            RecipeCollection::ShoppingCart => SeaQuery::select()
                .column(shopping_cart::Column::RecipeId)
                .from(shopping_cart::Entity)
                .and_where(shopping_cart::Column::UserId.eq(user_id))
                .to_owned(),
        }
    }

    /// Which of `recipe_ids` are in the user's collection.
    pub async fn members_among<C: ConnectionTrait>(
        self,
        db: &C,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>, DbErr> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<i32> = match self {
            RecipeCollection::Favorites => {
                favorite::Entity::find()
                    .filter(favorite::Column::UserId.eq(user_id))
                    .filter(favorite::Column::RecipeId.is_in(recipe_ids.to_vec()))
                    .select_only()
                    .column(favorite::Column::RecipeId)
                    .into_tuple::<i32>()
                    .all(db)
                    .await?
            }
            RecipeCollection::ShoppingCart => {
                shopping_cart::Entity::find()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.to_vec()))
                    .select_only()
                    .column(shopping_cart::Column::RecipeId)
                    .into_tuple::<i32>()
                    .all(db)
                    .await?
            }
        };
        Ok(ids.into_iter().collect())
    }
}
