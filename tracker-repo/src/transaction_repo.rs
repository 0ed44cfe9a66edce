use crate::error::RepoError;
use crate::lifecycle::{truncate_to_micros, Deletion};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    pub offset: i64,
    pub limit: i64,
}

impl PageOptions {
    /// Rejects negative offsets and limits, which PostgreSQL refuses.
    pub fn check(&self) -> Result<(), RepoError> {
        if self.offset < 0 || self.limit < 0 {
            return Err(RepoError::InvalidPage {
                offset: self.offset,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

#[derive(Default, Debug, Clone)]
pub struct Filter {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub tag: Option<Uuid>,
    pub description: Option<String>,
}

impl Filter {
    pub const NONE: Filter = Filter {
        from: None,
        until: None,
        tag: None,
        description: None,
    };

    /// Date bounds compare at microsecond precision, like stored dates.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(from) = self.from {
            if transaction.transaction_date < truncate_to_micros(from) {
                return false;
            }
        }
        if let Some(until) = self.until {
            if transaction.transaction_date > truncate_to_micros(until) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !transaction.tags.contains(tag) {
                return false;
            }
        }
        if let Some(description) = &self.description {
            if &transaction.description != description {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait TransactionRepo: Sync + Send {
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, RepoError>;

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, RepoError>;

    /// Newest first: by transaction date, then creation time, then id.
    async fn get_all_transactions(
        &self,
        user_id: Uuid,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Transaction>, RepoError>;

    /// Replaces the amount, description, date and tag set.
    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        updated_transaction: NewTransaction,
    ) -> Result<Transaction, RepoError>;

    async fn attach_tag(&self, transaction_id: Uuid, tag_id: Uuid) -> Result<(), RepoError>;

    async fn detach_tag(&self, transaction_id: Uuid, tag_id: Uuid) -> Result<(), RepoError>;

    async fn soft_delete_transaction(&self, transaction_id: Uuid)
        -> Result<Transaction, RepoError>;

    /// Removes the transaction together with its reversals and tag links.
    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), RepoError>;
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub created_by: Uuid,
    pub tags: HashSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: Deletion,
}

impl Ord for Transaction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.transaction_date
            .cmp(&other.transaction_date)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Transaction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub tags: HashSet<Uuid>,
}

impl NewTransaction {
    pub fn new(
        amount: Decimal,
        description: String,
        transaction_date: DateTime<Utc>,
        tags: HashSet<Uuid>,
    ) -> NewTransaction {
        NewTransaction {
            amount,
            description,
            transaction_date,
            tags,
        }
    }
}
