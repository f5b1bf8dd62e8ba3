use driftwatch_config::load_config;
use std::path::Path;
use std::time::Duration;

#[test]
fn load_valid_fixture() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/driftwatch.yaml");
    let config = load_config(&path).expect("should load without error");

    assert_eq!(config.region, "us-east-1");
    assert_eq!(config.provider, "local");
    assert_eq!(config.interval, Duration::from_secs(120));
    assert_eq!(config.metrics_port, 9191);
    assert_eq!(config.policy.stale_after_days, 14);
    assert_eq!(config.policy.tag_namespace, "acme");
}

#[test]
fn missing_file_returns_error() {
    let path = Path::new("/nonexistent/path/driftwatch.yaml");
    assert!(load_config(path).is_err());
}

#[test]
fn env_override_wins_over_file_value() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/driftwatch.yaml");
    std::env::set_var("DRIFTWATCH_REGION", "eu-central-1");
    let config = load_config(&path).expect("should load without error");
    std::env::remove_var("DRIFTWATCH_REGION");

    assert_eq!(config.region, "eu-central-1");
}
