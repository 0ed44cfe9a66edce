pub mod generator;
pub mod test_user;

use chrono::Utc;
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use tracker_repo::lifecycle::ManualClock;
use tracker_repo::Repos;

#[derive(Deserialize)]
struct TestConfig {
    database_url: String,
}

#[derive(Debug)]
pub enum RepoType {
    SQLx,
    Mem,
}

fn database_url() -> Option<String> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        return Some(url);
    }
    let config = fs::read_to_string("config_test.toml").ok()?;
    let config: TestConfig = toml::from_str(config.as_str()).ok()?;
    Some(config.database_url)
}

/// A clock frozen at the current time.
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc::now()))
}

/// PostgreSQL cases are `#[ignore]`d and run with `--include-ignored`. They
/// need `DATABASE_URL` or a `config_test.toml` naming the database.
pub async fn build_repos(repo_type: RepoType, clock: Arc<ManualClock>) -> Repos {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    match repo_type {
        RepoType::SQLx => {
            let database_url = database_url()
                .expect("PostgreSQL tests need DATABASE_URL or config_test.toml");
            tracker_repo::sqlx_repo::create_repos_with_clock(&database_url, 1, clock)
                .await
                .unwrap()
        }
        RepoType::Mem => tracker_repo::mem_repo::create_repos_with_clock(clock),
    }
}
