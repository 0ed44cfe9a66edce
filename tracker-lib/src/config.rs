use anyhow::Context;
use serde::Deserialize;
use std::env::VarError;
use std::path::PathBuf;
use std::{env, fs};
use tracing::level_filters::LevelFilter;

const DEFAULT_MAX_POOL_SIZE: u32 = 10;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Deserialize, Debug, PartialEq, Eq)]
pub struct Config {
    /// PostgreSQL URL. The in-memory store is used when absent.
    pub database_url: Option<String>,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Enables trace export to Honeycomb.
    pub honeycomb_api_key: Option<String>,
}

fn default_max_pool_size() -> u32 {
    DEFAULT_MAX_POOL_SIZE
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            log_level: default_log_level(),
            honeycomb_api_key: None,
        }
    }
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Config, anyhow::Error> {
        let config = fs::read_to_string(path).context("Unable to read config file")?;
        let config: Config =
            toml::from_str(config.as_str()).with_context(|| "Unable to parse config")?;
        Ok(config)
    }

    pub fn from_env() -> Result<Config, anyhow::Error> {
        let database_url = read_env("DATABASE_URL")?;
        let max_pool_size = match read_env("MAX_POOL_SIZE")? {
            Some(size) => size
                .parse()
                .context("Unable to parse MAX_POOL_SIZE value")?,
            None => DEFAULT_MAX_POOL_SIZE,
        };
        let log_level = read_env("LOG_LEVEL")?.unwrap_or_else(default_log_level);
        let honeycomb_api_key = read_env("HONEYCOMB_API_KEY")?;

        let config = Config {
            database_url,
            max_pool_size,
            log_level,
            honeycomb_api_key,
        };
        Ok(config)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, anyhow::Error> {
        self.log_level
            .parse()
            .with_context(|| format!("Invalid log level: {}", self.log_level))
    }
}

fn read_env(key: &str) -> Result<Option<String>, anyhow::Error> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Unable to read env var: {}", key)),
    }
}
