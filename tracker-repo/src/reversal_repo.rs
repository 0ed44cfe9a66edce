use crate::error::RepoError;
use crate::lifecycle::Deletion;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reversals offset a transaction in full or in part without touching it.
#[async_trait]
pub trait ReversalRepo: Sync + Send {
    async fn create_reversal(
        &self,
        user_id: Uuid,
        new_reversal: NewReversal,
    ) -> Result<TransactionReversal, RepoError>;

    async fn get_reversal(&self, reversal_id: Uuid) -> Result<TransactionReversal, RepoError>;

    /// Oldest first.
    async fn get_reversals(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionReversal>, RepoError>;

    async fn update_reversal(
        &self,
        reversal_id: Uuid,
        updated_reversal: NewReversal,
    ) -> Result<TransactionReversal, RepoError>;

    async fn soft_delete_reversal(
        &self,
        reversal_id: Uuid,
    ) -> Result<TransactionReversal, RepoError>;

    async fn delete_reversal(&self, reversal_id: Uuid) -> Result<(), RepoError>;
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct TransactionReversal {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: Deletion,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewReversal {
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
}

impl NewReversal {
    pub const fn new(
        transaction_id: Uuid,
        amount: Decimal,
        description: String,
        transaction_date: DateTime<Utc>,
    ) -> NewReversal {
        NewReversal {
            transaction_id,
            amount,
            description,
            transaction_date,
        }
    }
}
