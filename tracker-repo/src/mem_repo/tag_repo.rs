use super::MemRepo;
use crate::constraints::{TAG_CREATED_BY_FKEY, UNIQUE_TAG_NAME_BY_USER};
use crate::error::RepoError;
use crate::lifecycle::Deletion;
use crate::tag_repo::{NewTag, TagRepo, TransactionTag};
use async_trait::async_trait;
use uuid::Uuid;

const ENTITY: &str = "TransactionTag";

#[async_trait]
impl TagRepo for MemRepo {
    async fn create_tag(&self, user_id: Uuid, new_tag: NewTag) -> Result<TransactionTag, RepoError> {
        let mut write_guard = self.write_lock()?;

        if !write_guard.users.contains_key(&user_id) {
            return Err(RepoError::foreign_key(TAG_CREATED_BY_FKEY));
        }
        // soft-deleted tags still hold their name
        if write_guard
            .tags
            .values()
            .any(|t| t.created_by == user_id && t.name == new_tag.name)
        {
            return Err(RepoError::uniqueness(UNIQUE_TAG_NAME_BY_USER));
        }

        let tag = new_tag.to_tag(user_id, self.clock.now());
        write_guard.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn get_tag(&self, tag_id: Uuid) -> Result<TransactionTag, RepoError> {
        let read_guard = self.read_lock()?;

        match read_guard.tags.get(&tag_id) {
            Some(tag) if !tag.deleted.is_deleted() => Ok(tag.clone()),
            _ => Err(RepoError::not_found(ENTITY, tag_id)),
        }
    }

    async fn get_all_tags(&self, user_id: Uuid) -> Result<Vec<TransactionTag>, RepoError> {
        let read_guard = self.read_lock()?;

        let mut tags: Vec<TransactionTag> = read_guard
            .tags
            .values()
            .filter(|t| t.created_by == user_id && !t.deleted.is_deleted())
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(tags)
    }

    async fn update_tag(&self, tag_id: Uuid, tag: NewTag) -> Result<TransactionTag, RepoError> {
        let mut write_guard = self.write_lock()?;

        let Some(created_by) = write_guard
            .tags
            .get(&tag_id)
            .filter(|t| !t.deleted.is_deleted())
            .map(|t| t.created_by)
        else {
            return Err(RepoError::not_found(ENTITY, tag_id));
        };
        if write_guard
            .tags
            .values()
            .any(|t| t.id != tag_id && t.created_by == created_by && t.name == tag.name)
        {
            return Err(RepoError::uniqueness(UNIQUE_TAG_NAME_BY_USER));
        }

        let now = self.clock.now();
        match write_guard.tags.get_mut(&tag_id) {
            Some(stored) => {
                stored.name = tag.name;
                stored.updated_at = now;
                Ok(stored.clone())
            }
            None => Err(RepoError::not_found(ENTITY, tag_id)),
        }
    }

    async fn soft_delete_tag(&self, tag_id: Uuid) -> Result<TransactionTag, RepoError> {
        let mut write_guard = self.write_lock()?;

        let now = self.clock.now();
        match write_guard.tags.get_mut(&tag_id) {
            Some(tag) if !tag.deleted.is_deleted() => {
                tag.deleted = Deletion::Deleted(now);
                tag.updated_at = now;
                Ok(tag.clone())
            }
            _ => Err(RepoError::not_found(ENTITY, tag_id)),
        }
    }

    async fn delete_tag(&self, tag_id: Uuid) -> Result<(), RepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.remove_tag(tag_id) {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, tag_id))
        }
    }
}
