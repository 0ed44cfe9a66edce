use super::error::map_write_error;
use super::SQLxRepo;
use crate::constraints::check_amount_precision;
use crate::error::RepoError;
use crate::lifecycle::truncate_to_micros;
use crate::reversal_repo::{NewReversal, ReversalRepo, TransactionReversal};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{query, query_as};
use tracing::instrument;
use uuid::Uuid;

const ENTITY: &str = "TransactionReversal";

#[derive(sqlx::FromRow)]
struct ReversalEntry {
    id: Uuid,
    transaction_id: Uuid,
    amount: Decimal,
    description: String,
    transaction_date: DateTime<Utc>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ReversalEntry> for TransactionReversal {
    fn from(value: ReversalEntry) -> Self {
        TransactionReversal {
            id: value.id,
            transaction_id: value.transaction_id,
            amount: value.amount,
            description: value.description,
            transaction_date: value.transaction_date,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
            deleted: value.deleted_at.into(),
        }
    }
}

#[async_trait]
impl ReversalRepo for SQLxRepo {
    #[instrument(skip(self, new_reversal))]
    async fn create_reversal(
        &self,
        user_id: Uuid,
        new_reversal: NewReversal,
    ) -> Result<TransactionReversal, RepoError> {
        let amount = check_amount_precision(new_reversal.amount)?;
        let reversal_entry = query_as::<_, ReversalEntry>(
            "INSERT INTO transaction_reversals(id, transaction_id, amount, description, transaction_date, created_by, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_reversal.transaction_id)
        .bind(amount)
        .bind(&new_reversal.description)
        .bind(truncate_to_micros(new_reversal.transaction_date))
        .bind(user_id)
        .bind(self.clock.now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                format!("Unable to reverse transaction {}", new_reversal.transaction_id),
            )
        })?;
        Ok(reversal_entry.into())
    }

    #[instrument(skip(self))]
    async fn get_reversal(&self, reversal_id: Uuid) -> Result<TransactionReversal, RepoError> {
        let reversal_entry = query_as::<_, ReversalEntry>(
            "SELECT * FROM transaction_reversals WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(reversal_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to get reversal {}", reversal_id))?;
        reversal_entry
            .map(|r| r.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, reversal_id))
    }

    #[instrument(skip(self))]
    async fn get_reversals(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionReversal>, RepoError> {
        let reversals = query_as::<_, ReversalEntry>(
            "SELECT * FROM transaction_reversals WHERE transaction_id = $1 AND deleted_at IS NULL ORDER BY transaction_date, created_at, id",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get reversals of {}", transaction_id))?
        .into_iter()
        .map(|r| r.into())
        .collect();
        Ok(reversals)
    }

    #[instrument(skip(self, updated_reversal))]
    async fn update_reversal(
        &self,
        reversal_id: Uuid,
        updated_reversal: NewReversal,
    ) -> Result<TransactionReversal, RepoError> {
        let amount = check_amount_precision(updated_reversal.amount)?;
        let reversal_entry = query_as::<_, ReversalEntry>(
            "UPDATE transaction_reversals SET transaction_id = $2, amount = $3, description = $4, transaction_date = $5, updated_at = $6 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(reversal_id)
        .bind(updated_reversal.transaction_id)
        .bind(amount)
        .bind(&updated_reversal.description)
        .bind(truncate_to_micros(updated_reversal.transaction_date))
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, format!("Unable to update reversal {}", reversal_id)))?;
        reversal_entry
            .map(|r| r.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, reversal_id))
    }

    #[instrument(skip(self))]
    async fn soft_delete_reversal(
        &self,
        reversal_id: Uuid,
    ) -> Result<TransactionReversal, RepoError> {
        let reversal_entry = query_as::<_, ReversalEntry>(
            "UPDATE transaction_reversals SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(reversal_id)
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to soft delete reversal {}", reversal_id))?;
        reversal_entry
            .map(|r| r.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, reversal_id))
    }

    #[instrument(skip(self))]
    async fn delete_reversal(&self, reversal_id: Uuid) -> Result<(), RepoError> {
        let result = query("DELETE FROM transaction_reversals WHERE id = $1")
            .bind(reversal_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete reversal {}", reversal_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, reversal_id))
        }
    }
}
