mod error;
mod reversal_repo;
mod tag_repo;
mod transaction_repo;
mod user_repo;

use crate::lifecycle::{Clock, SystemClock};
use crate::{HealthCheck, Repos};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use tracing::{info, instrument};

pub async fn create_repos(database_url: &str, max_pool_size: u32) -> Result<Repos, anyhow::Error> {
    create_repos_with_clock(database_url, max_pool_size, Arc::new(SystemClock)).await
}

pub async fn create_repos_with_clock(
    database_url: &str,
    max_pool_size: u32,
    clock: Arc<dyn Clock>,
) -> Result<Repos, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_pool_size)
        .connect(database_url)
        .await
        .context("Unable to connect to database")?;

    info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Unable to run migrations")?;

    Ok(Repos::from_backend(Arc::new(SQLxRepo::new(pool, clock))))
}

/// PostgreSQL store. Integrity rules are declared in the schema and enforced
/// by the database inside the statement or transaction that writes the row.
pub struct SQLxRepo {
    pool: Pool<Postgres>,
    clock: Arc<dyn Clock>,
}

impl SQLxRepo {
    pub fn new(pool: Pool<Postgres>, clock: Arc<dyn Clock>) -> SQLxRepo {
        SQLxRepo { pool, clock }
    }
}

#[async_trait]
impl HealthCheck for SQLxRepo {
    #[instrument(skip(self))]
    async fn check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
