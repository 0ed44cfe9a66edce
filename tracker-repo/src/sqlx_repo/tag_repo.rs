use super::error::map_write_error;
use super::SQLxRepo;
use crate::error::RepoError;
use crate::tag_repo::{NewTag, TagRepo, TransactionTag};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};
use tracing::instrument;
use uuid::Uuid;

const ENTITY: &str = "TransactionTag";

#[derive(sqlx::FromRow)]
struct TagEntry {
    id: Uuid,
    name: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<TagEntry> for TransactionTag {
    fn from(value: TagEntry) -> Self {
        TransactionTag {
            id: value.id,
            name: value.name,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
            deleted: value.deleted_at.into(),
        }
    }
}

#[async_trait]
impl TagRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn create_tag(&self, user_id: Uuid, new_tag: NewTag) -> Result<TransactionTag, RepoError> {
        let tag = new_tag.to_tag(user_id, self.clock.now());
        let tag_entry = query_as::<_, TagEntry>(
            "INSERT INTO transaction_tags(id, name, created_by, created_at, updated_at) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(tag.id)
        .bind(&tag.name)
        .bind(tag.created_by)
        .bind(tag.created_at)
        .bind(tag.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, format!("Unable to create tag {}", tag.name)))?;
        Ok(tag_entry.into())
    }

    #[instrument(skip(self))]
    async fn get_tag(&self, tag_id: Uuid) -> Result<TransactionTag, RepoError> {
        let tag_entry = query_as::<_, TagEntry>(
            "SELECT * FROM transaction_tags WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(tag_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to get tag {}", tag_id))?;
        tag_entry
            .map(|t| t.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, tag_id))
    }

    #[instrument(skip(self))]
    async fn get_all_tags(&self, user_id: Uuid) -> Result<Vec<TransactionTag>, RepoError> {
        let tags = query_as::<_, TagEntry>(
            "SELECT * FROM transaction_tags WHERE created_by = $1 AND deleted_at IS NULL ORDER BY name, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get tags for user {}", user_id))?
        .into_iter()
        .map(|t| t.into())
        .collect();
        Ok(tags)
    }

    #[instrument(skip(self))]
    async fn update_tag(&self, tag_id: Uuid, tag: NewTag) -> Result<TransactionTag, RepoError> {
        let tag_entry = query_as::<_, TagEntry>(
            "UPDATE transaction_tags SET name = $2, updated_at = $3 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(tag_id)
        .bind(&tag.name)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, format!("Unable to update tag {}", tag_id)))?;
        tag_entry
            .map(|t| t.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, tag_id))
    }

    #[instrument(skip(self))]
    async fn soft_delete_tag(&self, tag_id: Uuid) -> Result<TransactionTag, RepoError> {
        let tag_entry = query_as::<_, TagEntry>(
            "UPDATE transaction_tags SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(tag_id)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to soft delete tag {}", tag_id))?;
        tag_entry
            .map(|t| t.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, tag_id))
    }

    #[instrument(skip(self))]
    async fn delete_tag(&self, tag_id: Uuid) -> Result<(), RepoError> {
        let result = query("DELETE FROM transaction_tags WHERE id = $1")
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete tag {}", tag_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, tag_id))
        }
    }
}
