use crate::error::RepoError;
use crate::lifecycle::Deletion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[async_trait]
pub trait TagRepo: Sync + Send {
    async fn create_tag(&self, user_id: Uuid, new_tag: NewTag) -> Result<TransactionTag, RepoError>;

    async fn get_tag(&self, tag_id: Uuid) -> Result<TransactionTag, RepoError>;

    /// Tags created by `user_id`, ordered by name.
    async fn get_all_tags(&self, user_id: Uuid) -> Result<Vec<TransactionTag>, RepoError>;

    async fn update_tag(&self, tag_id: Uuid, tag: NewTag) -> Result<TransactionTag, RepoError>;

    async fn soft_delete_tag(&self, tag_id: Uuid) -> Result<TransactionTag, RepoError>;

    async fn delete_tag(&self, tag_id: Uuid) -> Result<(), RepoError>;
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct TransactionTag {
    pub id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: Deletion,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewTag {
    pub name: String,
}

impl NewTag {
    pub fn new(name: impl Into<String>) -> NewTag {
        NewTag { name: name.into() }
    }

    pub fn to_tag(self, created_by: Uuid, created_at: DateTime<Utc>) -> TransactionTag {
        TransactionTag {
            id: Uuid::new_v4(),
            name: self.name,
            created_by,
            created_at,
            updated_at: created_at,
            deleted: Deletion::Active,
        }
    }
}
