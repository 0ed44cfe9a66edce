use crate::error::RepoError;
use crate::lifecycle::Deletion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[async_trait]
pub trait UserRepo: Sync + Send {
    async fn create_user(&self, new_user: NewUser) -> Result<User, RepoError>;

    async fn get_user(&self, user_id: Uuid) -> Result<User, RepoError>;

    async fn get_user_by_email(&self, email: &str) -> Result<User, RepoError>;

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> Result<User, RepoError>;

    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), RepoError>;

    async fn record_login(&self, user_id: Uuid) -> Result<User, RepoError>;

    async fn soft_delete_user(&self, user_id: Uuid) -> Result<User, RepoError>;

    /// Removes the user and everything it created.
    async fn delete_user(&self, user_id: Uuid) -> Result<(), RepoError>;
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: Deletion,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewUser {
    /// Generated on insert when absent.
    pub id: Option<Uuid>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> NewUser {
        NewUser {
            id: None,
            email: email.into(),
            first_name: None,
            last_name: None,
            is_active: true,
            is_superuser: false,
        }
    }

    pub fn with_name(mut self, first_name: &str, last_name: &str) -> NewUser {
        self.first_name = Some(first_name.to_owned());
        self.last_name = Some(last_name.to_owned());
        self
    }

    pub fn to_user(self, created_at: DateTime<Utc>) -> User {
        User {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            is_active: self.is_active,
            is_superuser: self.is_superuser,
            password_hash: None,
            last_login: None,
            created_at,
            updated_at: created_at,
            deleted: Deletion::Active,
        }
    }
}

/// Replacement values for the editable profile fields of a user.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserUpdate {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl From<User> for UserUpdate {
    fn from(user: User) -> Self {
        UserUpdate {
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
        }
    }
}
