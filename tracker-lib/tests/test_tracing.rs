use tracker_lib::config::Config;

// The global subscriber can be installed once per process.
#[test]
fn test_init_tracing() {
    let invalid = Config {
        log_level: "loud".to_owned(),
        ..Config::default()
    };
    assert!(tracker_lib::tracing::init("tracker-test", &invalid).is_err());

    let config = Config {
        log_level: "debug".to_owned(),
        ..Config::default()
    };
    tracker_lib::tracing::init("tracker-test", &config).unwrap();
    assert!(tracker_lib::tracing::init("tracker-test", &config).is_err());
}
