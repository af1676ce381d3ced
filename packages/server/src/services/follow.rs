use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;

use crate::entity::{follow, recipe, user};
use crate::error::AppError;
use crate::models::recipe::RecipeShortResponse;
use crate::models::shared::PageQuery;
use crate::models::user::{SubscriptionResponse, UserResponse};

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Make `user_id` follow `author_id` and return the author.
pub async fn subscribe<C: ConnectionTrait + TransactionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<user::Model, AppError> {
    let txn = db.begin().await?;
    let author = find_user(&txn, author_id).await?;
    let link = follow::ActiveModel::link(user_id, author_id, Utc::now())
        .ok_or(AppError::SelfFollow)?;

    let existing = follow::Entity::find_by_id((user_id, author_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::AlreadyFollowing);
    }

    match link.insert(&txn).await {
        Ok(_) => {}
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            tracing::debug!("Follow race condition: unique constraint caught on insert");
            return Err(AppError::AlreadyFollowing);
        }
        Err(e) => return Err(e.into()),
    }

    txn.commit().await?;
    tracing::info!(user_id, author_id, "Subscribed");
    Ok(author)
}

/// Remove the follow edge `user_id -> author_id`.
pub async fn unsubscribe<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<(), AppError> {
    find_user(db, author_id).await?;
    let result = follow::Entity::delete_by_id((user_id, author_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFollowing);
    }
    tracing::info!(user_id, author_id, "Unsubscribed");
    Ok(())
}

pub async fn is_following<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    Ok(follow::Entity::find_by_id((user_id, author_id))
        .one(db)
        .await?
        .is_some())
}

/// Which of `author_ids` the user follows.
pub async fn followed_among<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_ids: &[i32],
) -> Result<HashSet<i32>, DbErr> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<i32> = follow::Entity::find()
        .filter(follow::Column::UserId.eq(user_id))
        .filter(follow::Column::AuthorId.is_in(author_ids.to_vec()))
        .select_only()
        .column(follow::Column::AuthorId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Profile of a followed author with their newest recipes, at most
/// `recipes_limit` of them, and the uncapped recipe count.
pub async fn subscription_of<C: ConnectionTrait>(
    db: &C,
    author: user::Model,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionResponse, DbErr> {
    let own_recipes = recipe::Entity::find().filter(recipe::Column::AuthorId.eq(author.id));
    let recipes_count = own_recipes.clone().count(db).await?;
    let recipes = own_recipes
        .order_by_desc(recipe::Column::PubDate)
        .order_by_desc(recipe::Column::Id)
        .limit(recipes_limit)
        .all(db)
        .await?
        .into_iter()
        .map(RecipeShortResponse::from)
        .collect();

    Ok(SubscriptionResponse {
        author: UserResponse::new(author, true),
        recipes,
        recipes_count,
    })
}

/// One page of the authors `user_id` follows, ordered by username.
pub async fn subscriptions<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    page: PageQuery,
    recipes_limit: Option<u64>,
) -> Result<(Vec<SubscriptionResponse>, u64), AppError> {
    let followed = SeaQuery::select()
        .column(follow::Column::AuthorId)
        .from(follow::Entity)
        .and_where(follow::Column::UserId.eq(user_id))
        .to_owned();
    let select = user::Entity::find().filter(user::Column::Id.in_subquery(followed));

    let (_, limit) = page.window();
    let total = select.clone().paginate(db, limit).num_items().await?;
    let authors = select
        .order_by_asc(user::Column::Username)
        .offset(Some(page.offset()))
        .limit(Some(limit))
        .all(db)
        .await?;

    let mut data = Vec::with_capacity(authors.len());
    for author in authors {
        data.push(subscription_of(db, author, recipes_limit).await?);
    }
    Ok((data, total))
}
