use super::{MemRepo, State, TagLink, TransactionEntry};
use crate::constraints::{
    check_entry, LINK_TAG_FKEY, LINK_TRANSACTION_FKEY, TRANSACTION_CREATED_BY_FKEY,
    UNIQUE_TRANSACTION,
};
use crate::error::RepoError;
use crate::lifecycle::Deletion;
use crate::transaction_repo::{Filter, NewTransaction, PageOptions, Transaction, TransactionRepo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use uuid::Uuid;

const ENTITY: &str = "Transaction";

impl State {
    fn check_transaction_unique(
        &self,
        id: Uuid,
        amount: Decimal,
        description: &str,
        transaction_date: DateTime<Utc>,
        created_by: Uuid,
    ) -> Result<(), RepoError> {
        let duplicate = self.transactions.values().any(|t| {
            t.id != id
                && t.amount == amount
                && t.description == description
                && t.transaction_date == transaction_date
                && t.created_by == created_by
        });
        if duplicate {
            return Err(RepoError::uniqueness(UNIQUE_TRANSACTION));
        }
        Ok(())
    }

    fn check_tags_exist(&self, tags: &HashSet<Uuid>) -> Result<(), RepoError> {
        if tags.iter().any(|tag_id| !self.tags.contains_key(tag_id)) {
            return Err(RepoError::foreign_key(LINK_TAG_FKEY));
        }
        Ok(())
    }

    fn replace_tags(&mut self, transaction_id: Uuid, tags: HashSet<Uuid>) {
        self.tag_links
            .retain(|link| link.transaction_id != transaction_id);
        self.tag_links.extend(tags.into_iter().map(|tag_id| TagLink {
            transaction_id,
            tag_id,
        }));
    }
}

#[async_trait]
impl TransactionRepo for MemRepo {
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, RepoError> {
        let mut write_guard = self.write_lock()?;

        let created_at = self.clock.now();
        let (amount, transaction_date) = check_entry(
            new_transaction.amount,
            new_transaction.transaction_date,
            created_at,
        )?;
        let id = Uuid::new_v4();
        write_guard.check_transaction_unique(
            id,
            amount,
            &new_transaction.description,
            transaction_date,
            user_id,
        )?;
        if !write_guard.users.contains_key(&user_id) {
            return Err(RepoError::foreign_key(TRANSACTION_CREATED_BY_FKEY));
        }
        write_guard.check_tags_exist(&new_transaction.tags)?;

        let entry = TransactionEntry {
            id,
            amount,
            description: new_transaction.description,
            transaction_date,
            created_by: user_id,
            created_at,
            updated_at: created_at,
            deleted: Deletion::Active,
        };
        write_guard.transactions.insert(id, entry.clone());
        write_guard.replace_tags(id, new_transaction.tags.clone());

        Ok(entry.into_transaction(new_transaction.tags))
    }

    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, RepoError> {
        let read_guard = self.read_lock()?;

        match read_guard.transactions.get(&transaction_id) {
            Some(entry) if !entry.deleted.is_deleted() => Ok(read_guard.to_transaction(entry)),
            _ => Err(RepoError::not_found(ENTITY, transaction_id)),
        }
    }

    async fn get_all_transactions(
        &self,
        user_id: Uuid,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Transaction>, RepoError> {
        if let Some(page_options) = &page_options {
            page_options.check()?;
        }
        let read_guard = self.read_lock()?;

        let mut transactions: Vec<Transaction> = read_guard
            .transactions
            .values()
            .filter(|t| t.created_by == user_id && !t.deleted.is_deleted())
            .map(|t| read_guard.to_transaction(t))
            .filter(|t| filter.matches(t))
            .collect();
        transactions.sort_by(|a, b| b.cmp(a));

        let transactions = if let Some(page_options) = page_options {
            transactions
                .into_iter()
                .skip(page_options.offset as usize)
                .take(page_options.limit as usize)
                .collect()
        } else {
            transactions
        };

        Ok(transactions)
    }

    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        updated_transaction: NewTransaction,
    ) -> Result<Transaction, RepoError> {
        let mut write_guard = self.write_lock()?;

        let Some(stored) = write_guard
            .transactions
            .get(&transaction_id)
            .filter(|t| !t.deleted.is_deleted())
            .cloned()
        else {
            return Err(RepoError::not_found(ENTITY, transaction_id));
        };

        let (amount, transaction_date) = check_entry(
            updated_transaction.amount,
            updated_transaction.transaction_date,
            stored.created_at,
        )?;
        write_guard.check_transaction_unique(
            transaction_id,
            amount,
            &updated_transaction.description,
            transaction_date,
            stored.created_by,
        )?;
        write_guard.check_tags_exist(&updated_transaction.tags)?;

        let entry = TransactionEntry {
            amount,
            description: updated_transaction.description,
            transaction_date,
            updated_at: self.clock.now(),
            ..stored
        };
        write_guard.transactions.insert(transaction_id, entry.clone());
        write_guard.replace_tags(transaction_id, updated_transaction.tags.clone());

        Ok(entry.into_transaction(updated_transaction.tags))
    }

    async fn attach_tag(&self, transaction_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let mut write_guard = self.write_lock()?;

        if !write_guard.transactions.contains_key(&transaction_id) {
            return Err(RepoError::foreign_key(LINK_TRANSACTION_FKEY));
        }
        if !write_guard.tags.contains_key(&tag_id) {
            return Err(RepoError::foreign_key(LINK_TAG_FKEY));
        }
        write_guard.tag_links.insert(TagLink {
            transaction_id,
            tag_id,
        });

        Ok(())
    }

    async fn detach_tag(&self, transaction_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        let mut write_guard = self.write_lock()?;

        write_guard.tag_links.remove(&TagLink {
            transaction_id,
            tag_id,
        });

        Ok(())
    }

    async fn soft_delete_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Transaction, RepoError> {
        let mut write_guard = self.write_lock()?;

        let now = self.clock.now();
        let entry = match write_guard.transactions.get_mut(&transaction_id) {
            Some(entry) if !entry.deleted.is_deleted() => {
                entry.deleted = Deletion::Deleted(now);
                entry.updated_at = now;
                entry.clone()
            }
            _ => return Err(RepoError::not_found(ENTITY, transaction_id)),
        };

        Ok(write_guard.to_transaction(&entry))
    }

    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), RepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.remove_transaction(transaction_id) {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, transaction_id))
        }
    }
}
