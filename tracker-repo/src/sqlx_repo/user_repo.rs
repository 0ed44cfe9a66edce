use super::error::map_write_error;
use super::SQLxRepo;
use crate::error::RepoError;
use crate::user_repo::{NewUser, User, UserRepo, UserUpdate};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};
use tracing::instrument;
use uuid::Uuid;

const ENTITY: &str = "User";

#[derive(sqlx::FromRow)]
struct UserEntry {
    id: Uuid,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    is_active: bool,
    is_superuser: bool,
    password_hash: Option<String>,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<UserEntry> for User {
    fn from(value: UserEntry) -> Self {
        User {
            id: value.id,
            email: value.email,
            first_name: value.first_name,
            last_name: value.last_name,
            is_active: value.is_active,
            is_superuser: value.is_superuser,
            password_hash: value.password_hash,
            last_login: value.last_login,
            created_at: value.created_at,
            updated_at: value.updated_at,
            deleted: value.deleted_at.into(),
        }
    }
}

#[async_trait]
impl UserRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let user = new_user.to_user(self.clock.now());
        let user_entry: UserEntry = query_as::<_, UserEntry>(
            "INSERT INTO users(id, email, first_name, last_name, is_active, is_superuser, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_active)
        .bind(user.is_superuser)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, format!("Unable to create user {}", user.id)))?;
        Ok(user_entry.into())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: Uuid) -> Result<User, RepoError> {
        let user_entry: Option<UserEntry> =
            query_as::<_, UserEntry>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to get user {}", user_id))?;
        user_entry
            .map(|u| u.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, user_id))
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<User, RepoError> {
        let user_entry: Option<UserEntry> =
            query_as::<_, UserEntry>("SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to get user {}", email))?;
        user_entry
            .map(|u| u.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, email))
    }

    #[instrument(skip(self))]
    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<User, RepoError> {
        let user_entry: Option<UserEntry> = query_as::<_, UserEntry>(
            "UPDATE users SET email = $2, first_name = $3, last_name = $4, is_active = $5, is_superuser = $6, updated_at = $7 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(user_id)
        .bind(&update.email)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.is_active)
        .bind(update.is_superuser)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, format!("Unable to update user {}", user_id)))?;
        user_entry
            .map(|u| u.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, user_id))
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), RepoError> {
        let result = query(
            "UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Unable to update password for {}", user_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, user_id))
        }
    }

    #[instrument(skip(self))]
    async fn record_login(&self, user_id: Uuid) -> Result<User, RepoError> {
        let user_entry: Option<UserEntry> = query_as::<_, UserEntry>(
            "UPDATE users SET last_login = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(user_id)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to record login for {}", user_id))?;
        user_entry
            .map(|u| u.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, user_id))
    }

    #[instrument(skip(self))]
    async fn soft_delete_user(&self, user_id: Uuid) -> Result<User, RepoError> {
        let user_entry: Option<UserEntry> = query_as::<_, UserEntry>(
            "UPDATE users SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(user_id)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to soft delete user {}", user_id))?;
        user_entry
            .map(|u| u.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, user_id))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: Uuid) -> Result<(), RepoError> {
        let result = query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete user {}", user_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, user_id))
        }
    }
}
