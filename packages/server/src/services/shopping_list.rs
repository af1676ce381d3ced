//! Consolidated shopping list over a user's cart.
//!
//! [`collect`] does the aggregation in the database; [`render`] turns the
//! rows into the downloadable text document.

use std::fmt::Write as _;

use chrono::NaiveDate;
use sea_orm::*;

use crate::entity::{ingredient, recipe_ingredient};
use crate::services::collection::RecipeCollection;

/// Name of the downloaded file.
pub const FILE_NAME: &str = "shop_list.txt";

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Sum ingredient amounts across every recipe in the user's cart, grouped by
/// (name, unit) and ordered by name.
pub async fn collect<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<ShoppingListItem>, DbErr> {
    recipe_ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .column_as(recipe_ingredient::Column::Amount.sum(), "total_amount")
        .join(JoinType::InnerJoin, recipe_ingredient::Relation::Ingredient.def())
        .filter(
            recipe_ingredient::Column::RecipeId
                .in_subquery(RecipeCollection::ShoppingCart.recipe_ids_of(user_id)),
        )
        .group_by(ingredient::Column::Name)
        .group_by(ingredient::Column::MeasurementUnit)
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::MeasurementUnit)
        .into_model::<ShoppingListItem>()
        .all(db)
        .await
}

pub fn render(items: &[ShoppingListItem], date: NaiveDate) -> String {
    let mut out = format!("{}\nShopping list\n\n", date.format("%d-%m-%Y"));
    for item in items {
        let _ = writeln!(
            out,
            "{}: {}{}",
            item.name, item.total_amount, item.measurement_unit
        );
    }
    let _ = write!(out, "\n\nFoodgram.{}", date.format("%Y"));
    out
}
