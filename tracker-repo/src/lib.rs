use async_trait::async_trait;
use std::sync::Arc;

pub mod constraints;
pub mod error;
pub mod lifecycle;
pub mod reversal_repo;
pub mod tag_repo;
pub mod transaction_repo;
pub mod user_repo;

// implementation modules
pub mod mem_repo;
pub mod sqlx_repo;

use crate::reversal_repo::ReversalRepo;
use crate::tag_repo::TagRepo;
use crate::transaction_repo::TransactionRepo;
use crate::user_repo::UserRepo;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> bool;
}

/// Handles to every repository of one backend. All handles share the same
/// underlying store, so references between entities resolve across them.
#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn UserRepo>,
    pub tags: Arc<dyn TagRepo>,
    pub transactions: Arc<dyn TransactionRepo>,
    pub reversals: Arc<dyn ReversalRepo>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repos {
    fn from_backend<R>(backend: Arc<R>) -> Repos
    where
        R: UserRepo + TagRepo + TransactionRepo + ReversalRepo + HealthCheck + 'static,
    {
        Repos {
            users: backend.clone(),
            tags: backend.clone(),
            transactions: backend.clone(),
            reversals: backend.clone(),
            health: backend,
        }
    }
}
