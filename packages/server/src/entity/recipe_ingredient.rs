use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Smallest quantity an ingredient line may carry.
pub const MIN_AMOUNT: i64 = 1;
/// Largest quantity an ingredient line may carry (fits a SMALLINT column).
pub const MAX_AMOUNT: i64 = i16::MAX as i64;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_ingredient")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ingredient_id: i32,
    #[sea_orm(belongs_to, from = "recipe_id", to = "id")]
    pub recipe: HasOne<super::recipe::Entity>,
    #[sea_orm(belongs_to, from = "ingredient_id", to = "id")]
    pub ingredient: HasOne<super::ingredient::Entity>,

    pub amount: i16,
}

impl ActiveModelBehavior for ActiveModel {}
