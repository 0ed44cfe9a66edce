use super::error::map_write_error;
use super::SQLxRepo;
use crate::constraints::check_amount_precision;
use crate::error::RepoError;
use crate::lifecycle::{truncate_to_micros, Deletion};
use crate::transaction_repo::{Filter, NewTransaction, PageOptions, Transaction, TransactionRepo};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{query, query_as, PgConnection, Postgres, QueryBuilder};
use std::collections::HashSet;
use tracing::instrument;
use uuid::Uuid;

const ENTITY: &str = "Transaction";

/// Tag ids of the row aliased `t`, as a (possibly empty) array.
const TAGS_COLUMN: &str = "COALESCE((SELECT ARRAY_AGG(l.tag_id) FROM transactions_tags l WHERE l.transaction_id = t.id), ARRAY[]::UUID[]) AS tags";

#[derive(sqlx::FromRow)]
struct TransactionEntry {
    id: Uuid,
    amount: Decimal,
    description: String,
    transaction_date: DateTime<Utc>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    tags: Vec<Uuid>,
}

impl From<TransactionEntry> for Transaction {
    fn from(value: TransactionEntry) -> Self {
        Transaction {
            id: value.id,
            amount: value.amount,
            description: value.description,
            transaction_date: value.transaction_date,
            created_by: value.created_by,
            tags: value.tags.into_iter().collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
            deleted: Deletion::from(value.deleted_at),
        }
    }
}

impl SQLxRepo {
    #[instrument(skip(conn))]
    async fn replace_tag_links(
        conn: &mut PgConnection,
        transaction_id: Uuid,
        tags: &HashSet<Uuid>,
    ) -> Result<(), RepoError> {
        query("DELETE FROM transactions_tags WHERE transaction_id = $1")
            .bind(transaction_id)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Unable to clear tags of transaction {}", transaction_id))?;

        let tags: Vec<Uuid> = tags.iter().copied().collect();
        query(
            "INSERT INTO transactions_tags(transaction_id, tag_id) SELECT $1, UNNEST($2::UUID[]) ON CONFLICT DO NOTHING",
        )
        .bind(transaction_id)
        .bind(tags.as_slice())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            map_write_error(e, format!("Unable to tag transaction {}", transaction_id))
        })?;
        Ok(())
    }
}

#[async_trait]
impl TransactionRepo for SQLxRepo {
    #[instrument(skip(self, new_transaction))]
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, RepoError> {
        let amount = check_amount_precision(new_transaction.amount)?;
        let created_at = self.clock.now();
        let id = Uuid::new_v4();

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;
        let sql = format!(
            "INSERT INTO transactions AS t (id, amount, description, transaction_date, created_by, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING *, {}",
            TAGS_COLUMN
        );
        let transaction_entry = query_as::<_, TransactionEntry>(&sql)
            .bind(id)
            .bind(amount)
            .bind(&new_transaction.description)
            .bind(truncate_to_micros(new_transaction.transaction_date))
            .bind(user_id)
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, "Unable to insert transaction".to_owned()))?;
        Self::replace_tag_links(&mut tx, id, &new_transaction.tags).await?;
        tx.commit()
            .await
            .map_err(|e| map_write_error(e, format!("Unable to commit transaction {}", id)))?;

        let mut transaction: Transaction = transaction_entry.into();
        transaction.tags = new_transaction.tags;
        Ok(transaction)
    }

    #[instrument(skip(self))]
    async fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction, RepoError> {
        let sql = format!(
            "SELECT t.*, {} FROM transactions t WHERE t.id = $1 AND t.deleted_at IS NULL",
            TAGS_COLUMN
        );
        let transaction_entry = query_as::<_, TransactionEntry>(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get transaction {}", transaction_id))?;
        transaction_entry
            .map(|t| t.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, transaction_id))
    }

    #[instrument(skip(self))]
    async fn get_all_transactions(
        &self,
        user_id: Uuid,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<Vec<Transaction>, RepoError> {
        if let Some(po) = &page_options {
            po.check()?;
        }
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT t.*, {} FROM transactions t WHERE t.deleted_at IS NULL AND t.created_by = ",
            TAGS_COLUMN
        ));
        query_builder.push_bind(user_id);
        if let Some(from) = filter.from {
            query_builder
                .push(" AND t.transaction_date >= ")
                .push_bind(from);
        }
        if let Some(until) = filter.until {
            query_builder
                .push(" AND t.transaction_date <= ")
                .push_bind(until);
        }
        if let Some(tag) = filter.tag {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM transactions_tags f WHERE f.transaction_id = t.id AND f.tag_id = ")
                .push_bind(tag)
                .push(")");
        }
        if let Some(description) = filter.description {
            query_builder
                .push(" AND t.description = ")
                .push_bind(description);
        }
        query_builder.push(" ORDER BY t.transaction_date DESC, t.created_at DESC, t.id DESC");
        if let Some(po) = page_options {
            query_builder
                .push(" OFFSET ")
                .push_bind(po.offset)
                .push(" LIMIT ")
                .push_bind(po.limit);
        }

        let transactions = query_builder
            .build_query_as::<TransactionEntry>()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Unable to get transactions for user {}", user_id))?
            .into_iter()
            .map(|t| t.into())
            .collect();
        Ok(transactions)
    }

    #[instrument(skip(self, updated_transaction))]
    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        updated_transaction: NewTransaction,
    ) -> Result<Transaction, RepoError> {
        let amount = check_amount_precision(updated_transaction.amount)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;
        let sql = format!(
            "UPDATE transactions AS t SET amount = $2, description = $3, transaction_date = $4, updated_at = $5 WHERE t.id = $1 AND t.deleted_at IS NULL RETURNING *, {}",
            TAGS_COLUMN
        );
        let transaction_entry = query_as::<_, TransactionEntry>(&sql)
            .bind(transaction_id)
            .bind(amount)
            .bind(&updated_transaction.description)
            .bind(truncate_to_micros(updated_transaction.transaction_date))
            .bind(self.clock.now())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                map_write_error(e, format!("Unable to update transaction {}", transaction_id))
            })?
            .ok_or_else(|| RepoError::not_found(ENTITY, transaction_id))?;
        Self::replace_tag_links(&mut tx, transaction_id, &updated_transaction.tags).await?;
        tx.commit().await.map_err(|e| {
            map_write_error(e, format!("Unable to commit transaction {}", transaction_id))
        })?;

        let mut transaction: Transaction = transaction_entry.into();
        transaction.tags = updated_transaction.tags;
        Ok(transaction)
    }

    #[instrument(skip(self))]
    async fn attach_tag(&self, transaction_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        query(
            "INSERT INTO transactions_tags(transaction_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(transaction_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                format!("Unable to attach tag {} to {}", tag_id, transaction_id),
            )
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn detach_tag(&self, transaction_id: Uuid, tag_id: Uuid) -> Result<(), RepoError> {
        query("DELETE FROM transactions_tags WHERE transaction_id = $1 AND tag_id = $2")
            .bind(transaction_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to detach tag {} from {}", tag_id, transaction_id))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Transaction, RepoError> {
        let sql = format!(
            "UPDATE transactions AS t SET deleted_at = $2, updated_at = $2 WHERE t.id = $1 AND t.deleted_at IS NULL RETURNING *, {}",
            TAGS_COLUMN
        );
        let transaction_entry = query_as::<_, TransactionEntry>(&sql)
            .bind(transaction_id)
            .bind(self.clock.now())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to soft delete transaction {}", transaction_id))?;
        transaction_entry
            .map(|t| t.into())
            .ok_or_else(|| RepoError::not_found(ENTITY, transaction_id))
    }

    #[instrument(skip(self))]
    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), RepoError> {
        let result = query("DELETE FROM transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete transaction {}", transaction_id))?;
        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(RepoError::not_found(ENTITY, transaction_id))
        }
    }
}
