use std::env;
use tracker_lib::config::Config;

// Environment variables are process-wide, so this binary holds a single test.
#[test]
fn test_config_from_env() {
    env::remove_var("DATABASE_URL");
    env::remove_var("MAX_POOL_SIZE");
    env::remove_var("LOG_LEVEL");
    env::remove_var("HONEYCOMB_API_KEY");
    assert_eq!(Config::from_env().unwrap(), Config::default());

    env::set_var("DATABASE_URL", "postgres://tracker@localhost/tracker");
    env::set_var("MAX_POOL_SIZE", "3");
    env::set_var("LOG_LEVEL", "warn");
    env::set_var("HONEYCOMB_API_KEY", "hc-key");
    let config = Config::from_env().unwrap();
    assert_eq!(
        config.database_url.as_deref(),
        Some("postgres://tracker@localhost/tracker")
    );
    assert_eq!(config.max_pool_size, 3);
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.honeycomb_api_key.as_deref(), Some("hc-key"));

    env::set_var("MAX_POOL_SIZE", "lots");
    assert!(Config::from_env().is_err());
}
