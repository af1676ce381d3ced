use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "follow")]
pub struct Model {
    /// The subscriber.
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    /// The followed author.
    #[sea_orm(primary_key, auto_increment = false)]
    pub author_id: i32,
    #[sea_orm(belongs_to, relation_enum = "Follower", from = "user_id", to = "id")]
    pub follower: HasOne<super::user::Entity>,
    #[sea_orm(belongs_to, relation_enum = "Author", from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if let (Some(user), Some(author)) =
            (self.user_id.try_as_ref(), self.author_id.try_as_ref())
            && user == author
        {
            return Err(DbErr::Custom(format!("user {user} cannot follow themselves")));
        }
        Ok(self)
    }
}

impl ActiveModel {
    /// Build a new follow row. Returns `None` for a self-follow, which the
    /// follow table never stores.
    pub fn link(user_id: i32, author_id: i32, created_at: DateTimeUtc) -> Option<Self> {
        if user_id == author_id {
            return None;
        }
        Some(Self {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(created_at),
        })
    }
}
