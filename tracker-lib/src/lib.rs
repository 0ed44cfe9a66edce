pub mod config;
pub mod tracing;

use crate::config::Config;
use ::tracing::{info, warn};
use tracker_repo::Repos;

/// Opens the store named by `config`: PostgreSQL when a database URL is set
/// (running pending migrations), otherwise a fresh in-memory store.
pub async fn create_repos(config: &Config) -> Result<Repos, anyhow::Error> {
    match &config.database_url {
        Some(database_url) => {
            info!(max_pool_size = config.max_pool_size, "Using PostgreSQL store");
            tracker_repo::sqlx_repo::create_repos(database_url, config.max_pool_size).await
        }
        None => {
            warn!("No database_url configured, using in-memory store");
            Ok(tracker_repo::mem_repo::create_repos())
        }
    }
}
