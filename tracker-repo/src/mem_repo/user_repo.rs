use super::MemRepo;
use crate::constraints::UNIQUE_USER_EMAIL;
use crate::error::RepoError;
use crate::lifecycle::Deletion;
use crate::user_repo::{NewUser, User, UserRepo, UserUpdate};
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

const ENTITY: &str = "User";

#[async_trait]
impl UserRepo for MemRepo {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut write_guard = self.write_lock()?;

        let user = new_user.to_user(self.clock.now());
        if write_guard.users.contains_key(&user.id) {
            return Err(RepoError::uniqueness("users_pkey"));
        }
        if write_guard.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::uniqueness(UNIQUE_USER_EMAIL));
        }

        write_guard.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<User, RepoError> {
        let read_guard = self.read_lock()?;

        match read_guard.users.get(&user_id) {
            Some(user) if !user.deleted.is_deleted() => Ok(user.clone()),
            _ => Err(RepoError::not_found(ENTITY, user_id)),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, RepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .users
            .values()
            .find(|u| u.email == email && !u.deleted.is_deleted())
            .cloned()
            .ok_or_else(|| RepoError::not_found(ENTITY, email))
    }

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<User, RepoError> {
        let mut write_guard = self.write_lock()?;

        if !write_guard
            .users
            .get(&user_id)
            .is_some_and(|u| !u.deleted.is_deleted())
        {
            return Err(RepoError::not_found(ENTITY, user_id));
        }
        if write_guard
            .users
            .values()
            .any(|u| u.id != user_id && u.email == update.email)
        {
            return Err(RepoError::uniqueness(UNIQUE_USER_EMAIL));
        }

        let now = self.clock.now();
        match write_guard.users.get_mut(&user_id) {
            Some(user) if !user.deleted.is_deleted() => {
                user.email = update.email;
                user.first_name = update.first_name;
                user.last_name = update.last_name;
                user.is_active = update.is_active;
                user.is_superuser = update.is_superuser;
                user.updated_at = now;
                Ok(user.clone())
            }
            _ => Err(RepoError::not_found(ENTITY, user_id)),
        }
    }

    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), RepoError> {
        let mut write_guard = self.write_lock()?;

        let now = self.clock.now();
        match write_guard.users.get_mut(&user_id) {
            Some(user) if !user.deleted.is_deleted() => {
                user.password_hash = Some(password_hash.to_owned());
                user.updated_at = now;
                Ok(())
            }
            _ => Err(RepoError::not_found(ENTITY, user_id)),
        }
    }

    async fn record_login(&self, user_id: Uuid) -> Result<User, RepoError> {
        let mut write_guard = self.write_lock()?;

        let now = self.clock.now();
        match write_guard.users.get_mut(&user_id) {
            Some(user) if !user.deleted.is_deleted() => {
                user.last_login = Some(now);
                user.updated_at = now;
                Ok(user.clone())
            }
            _ => Err(RepoError::not_found(ENTITY, user_id)),
        }
    }

    async fn soft_delete_user(&self, user_id: Uuid) -> Result<User, RepoError> {
        let mut write_guard = self.write_lock()?;

        let now = self.clock.now();
        match write_guard.users.get_mut(&user_id) {
            Some(user) if !user.deleted.is_deleted() => {
                user.deleted = Deletion::Deleted(now);
                user.updated_at = now;
                Ok(user.clone())
            }
            _ => Err(RepoError::not_found(ENTITY, user_id)),
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), RepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.users.remove(&user_id).is_none() {
            return Err(RepoError::not_found(ENTITY, user_id));
        }

        let transaction_ids: HashSet<Uuid> = write_guard
            .transactions
            .values()
            .filter(|t| t.created_by == user_id)
            .map(|t| t.id)
            .collect();
        for transaction_id in transaction_ids {
            write_guard.remove_transaction(transaction_id);
        }

        let tag_ids: HashSet<Uuid> = write_guard
            .tags
            .values()
            .filter(|t| t.created_by == user_id)
            .map(|t| t.id)
            .collect();
        for tag_id in tag_ids {
            write_guard.remove_tag(tag_id);
        }

        write_guard
            .reversals
            .retain(|_, r| r.created_by != user_id);

        Ok(())
    }
}
