use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::auth::{hash_blocking, verify_blocking};
use crate::models::auth::{SetPasswordRequest, validate_set_password_request};
use crate::models::shared::PageQuery;
use crate::models::user::{
    RecipesLimitQuery, SubscriptionListResponse, SubscriptionQuery, SubscriptionResponse,
    UserListResponse, UserResponse,
};
use crate::services::follow;
use crate::state::AppState;

async fn find_user(db: &DatabaseConnection, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Paginated list of all users ordered by ID. `is_subscribed` reflects the caller and is false for anonymous requests.",
    params(PageQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    let select = user::Entity::find();
    let (_, limit) = query.window();
    let total = select.clone().paginate(&state.db, limit).num_items().await?;

    let users = select
        .order_by_asc(user::Column::Id)
        .offset(Some(query.offset()))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    let followed = match auth_user {
        Some(ref caller) => {
            let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
            follow::followed_among(&state.db, caller.user_id, &ids).await?
        }
        None => Default::default(),
    };

    let data = users
        .into_iter()
        .map(|u| {
            let is_subscribed = followed.contains(&u.id);
            UserResponse::new(u, is_subscribed)
        })
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: query.pagination(total),
    }))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(UserResponse::new(user, false)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user profile",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Invalid token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_user(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_user(&state.db, id).await?;
    let is_subscribed = match auth_user {
        Some(caller) => follow::is_following(&state.db, caller.user_id, id).await?,
        None => false,
    };
    Ok(Json(UserResponse::new(user, is_subscribed)))
}

#[utoipa::path(
    post,
    path = "/users/set_password",
    tag = "Users",
    operation_id = "setPassword",
    summary = "Change the current user's password",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation error or wrong current password (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn set_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    validate_set_password_request(&payload)?;

    let user = find_user(&state.db, auth_user.user_id).await?;
    if !verify_blocking(payload.current_password, user.password.clone()).await? {
        return Err(AppError::field(
            "current_password",
            "Current password is incorrect",
        ));
    }

    let hash = hash_blocking(payload.new_password).await?;
    let mut active: user::ActiveModel = user.into();
    active.password = Set(hash);
    active.update(&state.db).await?;

    tracing::info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/subscriptions",
    tag = "Subscriptions",
    operation_id = "listSubscriptions",
    summary = "List followed authors",
    description = "Authors the caller follows, ordered by username. Each entry carries the author's newest recipes, capped by `recipes_limit` when given, and the total recipe count.",
    params(SubscriptionQuery),
    responses(
        (status = 200, description = "Followed authors", body = SubscriptionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_subscriptions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SubscriptionQuery>,
) -> Result<Json<SubscriptionListResponse>, AppError> {
    let page = query.page();
    let (data, total) = follow::subscriptions(
        &state.db,
        auth_user.user_id,
        page,
        query.recipes_limit(),
    )
    .await?;

    Ok(Json(SubscriptionListResponse {
        data,
        pagination: page.pagination(total),
    }))
}

#[utoipa::path(
    post,
    path = "/users/{id}/subscribe",
    tag = "Subscriptions",
    operation_id = "subscribe",
    summary = "Follow an author",
    params(
        ("id" = i32, Path, description = "Author's user ID"),
        RecipesLimitQuery,
    ),
    responses(
        (status = 201, description = "Now following", body = SubscriptionResponse),
        (status = 400, description = "Cannot follow yourself (SELF_FOLLOW)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already following (ALREADY_FOLLOWING)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id, id))]
pub async fn subscribe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<RecipesLimitQuery>,
) -> Result<impl IntoResponse, AppError> {
    let author = follow::subscribe(&state.db, auth_user.user_id, id).await?;
    let body = follow::subscription_of(&state.db, author, query.recipes_limit()).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}/subscribe",
    tag = "Subscriptions",
    operation_id = "unsubscribe",
    summary = "Stop following an author",
    params(("id" = i32, Path, description = "Author's user ID")),
    responses(
        (status = 204, description = "Unfollowed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found or not followed (NOT_FOUND, NOT_FOLLOWING)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn unsubscribe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    follow::unsubscribe(&state.db, auth_user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
