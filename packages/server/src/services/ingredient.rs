use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;

use crate::entity::ingredient;
use crate::error::AppError;
use crate::models::shared::escape_like;

/// Ingredients whose name starts with `prefix`, ignoring case, ordered by name.
///
/// A missing or blank prefix matches nothing rather than the whole catalog.
pub async fn search<C: ConnectionTrait>(
    db: &C,
    prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let term = prefix.map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("{}%", escape_like(&term.to_lowercase()));
    ingredient::Entity::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(ingredient::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        )
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<ingredient::Model, AppError> {
    ingredient::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ingredient not found".into()))
}
