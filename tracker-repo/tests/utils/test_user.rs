use std::sync::Arc;
use tracing::info;
use tracker_repo::user_repo::{NewUser, UserRepo};
use uuid::Uuid;

pub fn unique_email() -> String {
    format!("test-user-{}@example.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    repo: Arc<dyn UserRepo>,
}

#[allow(dead_code)]
impl TestUser {
    pub async fn new(user_repo: &Arc<dyn UserRepo>) -> TestUser {
        let email = unique_email();
        let user = user_repo
            .create_user(NewUser::new(email.clone()))
            .await
            .unwrap();
        info!(user_id = %user.id, "Created user");
        TestUser {
            id: user.id,
            email,
            repo: user_repo.clone(),
        }
    }

    pub async fn delete(&self) {
        self.repo.delete_user(self.id).await.unwrap()
    }
}
