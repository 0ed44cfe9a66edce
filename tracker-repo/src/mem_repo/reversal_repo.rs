use super::{MemRepo, State};
use crate::constraints::{
    check_entry, REVERSAL_CREATED_BY_FKEY, REVERSAL_TRANSACTION_FKEY, UNIQUE_REVERSAL,
};
use crate::error::RepoError;
use crate::lifecycle::Deletion;
use crate::reversal_repo::{NewReversal, ReversalRepo, TransactionReversal};
use async_trait::async_trait;
use uuid::Uuid;

const ENTITY: &str = "TransactionReversal";

impl State {
    fn check_reversal_unique(&self, candidate: &TransactionReversal) -> Result<(), RepoError> {
        let duplicate = self.reversals.values().any(|r| {
            r.id != candidate.id
                && r.transaction_id == candidate.transaction_id
                && r.amount == candidate.amount
                && r.description == candidate.description
                && r.transaction_date == candidate.transaction_date
                && r.created_by == candidate.created_by
        });
        if duplicate {
            return Err(RepoError::uniqueness(UNIQUE_REVERSAL));
        }
        Ok(())
    }

    fn check_reversal_references(&self, candidate: &TransactionReversal) -> Result<(), RepoError> {
        if !self.transactions.contains_key(&candidate.transaction_id) {
            return Err(RepoError::foreign_key(REVERSAL_TRANSACTION_FKEY));
        }
        if !self.users.contains_key(&candidate.created_by) {
            return Err(RepoError::foreign_key(REVERSAL_CREATED_BY_FKEY));
        }
        Ok(())
    }
}

#[async_trait]
impl ReversalRepo for MemRepo {
    async fn create_reversal(
        &self,
        user_id: Uuid,
        new_reversal: NewReversal,
    ) -> Result<TransactionReversal, RepoError> {
        let mut write_guard = self.write_lock()?;

        let created_at = self.clock.now();
        let (amount, transaction_date) = check_entry(
            new_reversal.amount,
            new_reversal.transaction_date,
            created_at,
        )?;
        let reversal = TransactionReversal {
            id: Uuid::new_v4(),
            transaction_id: new_reversal.transaction_id,
            amount,
            description: new_reversal.description,
            transaction_date,
            created_by: user_id,
            created_at,
            updated_at: created_at,
            deleted: Deletion::Active,
        };
        write_guard.check_reversal_unique(&reversal)?;
        write_guard.check_reversal_references(&reversal)?;

        write_guard.reversals.insert(reversal.id, reversal.clone());
        Ok(reversal)
    }

    async fn get_reversal(&self, reversal_id: Uuid) -> Result<TransactionReversal, RepoError> {
        let read_guard = self.read_lock()?;

        match read_guard.reversals.get(&reversal_id) {
            Some(reversal) if !reversal.deleted.is_deleted() => Ok(reversal.clone()),
            _ => Err(RepoError::not_found(ENTITY, reversal_id)),
        }
    }

    async fn get_reversals(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionReversal>, RepoError> {
        let read_guard = self.read_lock()?;

        let mut reversals: Vec<TransactionReversal> = read_guard
            .reversals
            .values()
            .filter(|r| r.transaction_id == transaction_id && !r.deleted.is_deleted())
            .cloned()
            .collect();
        reversals.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });

        Ok(reversals)
    }

    async fn update_reversal(
        &self,
        reversal_id: Uuid,
        updated_reversal: NewReversal,
    ) -> Result<TransactionReversal, RepoError> {
        let mut write_guard = self.write_lock()?;

        let Some(stored) = write_guard
            .reversals
            .get(&reversal_id)
            .filter(|r| !r.deleted.is_deleted())
            .cloned()
        else {
            return Err(RepoError::not_found(ENTITY, reversal_id));
        };

        let (amount, transaction_date) = check_entry(
            updated_reversal.amount,
            updated_reversal.transaction_date,
            stored.created_at,
        )?;
        let reversal = TransactionReversal {
            transaction_id: updated_reversal.transaction_id,
            amount,
            description: updated_reversal.description,
            transaction_date,
            updated_at: self.clock.now(),
            ..stored
        };
        write_guard.check_reversal_unique(&reversal)?;
        write_guard.check_reversal_references(&reversal)?;

        write_guard.reversals.insert(reversal_id, reversal.clone());
        Ok(reversal)
    }

    async fn soft_delete_reversal(
        &self,
        reversal_id: Uuid,
    ) -> Result<TransactionReversal, RepoError> {
        let mut write_guard = self.write_lock()?;

        let now = self.clock.now();
        match write_guard.reversals.get_mut(&reversal_id) {
            Some(reversal) if !reversal.deleted.is_deleted() => {
                reversal.deleted = Deletion::Deleted(now);
                reversal.updated_at = now;
                Ok(reversal.clone())
            }
            _ => Err(RepoError::not_found(ENTITY, reversal_id)),
        }
    }

    async fn delete_reversal(&self, reversal_id: Uuid) -> Result<(), RepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.reversals.remove(&reversal_id).is_some() {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, reversal_id))
        }
    }
}
