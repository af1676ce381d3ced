use serde::{Deserialize, Serialize};

use super::recipe::RecipeShortResponse;
use super::shared::{MAX_ROW_BOUND, PageQuery, Pagination};

/// Public profile of a user as seen by the caller.
#[derive(Serialize, Deserialize, Debug, Clone, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice_cooks")]
    pub username: String,
    #[schema(example = "Alice")]
    pub first_name: String,
    #[schema(example = "Liddell")]
    pub last_name: String,
    /// Whether the caller follows this user. Always false for anonymous callers.
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(user: crate::entity::user::Model, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

/// A followed author together with a preview of their recipes.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    /// Newest recipes first, capped by `recipes_limit`.
    pub recipes: Vec<RecipeShortResponse>,
    /// Total number of the author's recipes, regardless of the cap.
    #[schema(example = 12)]
    pub recipes_count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubscriptionListResponse {
    pub data: Vec<SubscriptionResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SubscriptionQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Maximum number of recipes shown per author. Values that are not a
    /// non-negative integer are ignored.
    #[param(value_type = Option<u64>)]
    pub recipes_limit: Option<String>,
}

impl SubscriptionQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn recipes_limit(&self) -> Option<u64> {
        parse_recipes_limit(self.recipes_limit.as_deref())
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct RecipesLimitQuery {
    /// Maximum number of the author's recipes included in the response.
    #[param(value_type = Option<u64>)]
    pub recipes_limit: Option<String>,
}

impl RecipesLimitQuery {
    pub fn recipes_limit(&self) -> Option<u64> {
        parse_recipes_limit(self.recipes_limit.as_deref())
    }
}

/// `recipes_limit` is a digits-only string; anything else means no cap.
fn parse_recipes_limit(raw: Option<&str>) -> Option<u64> {
    let raw = raw?.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(raw.parse::<u64>().map_or(MAX_ROW_BOUND, |n| n.min(MAX_ROW_BOUND)))
}
