//! Config Tests

use std::time::Duration;

use undis::config::DEFAULT_PROMPT;
use undis::{Config, UndisError};

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.snapshot_path.to_str(), Some("undis.db"));
    assert_eq!(config.listen_addr, "0.0.0.0:8080");
    assert_eq!(config.pool_min_workers, 1);
    assert_eq!(config.pool_max_workers, 10);
    assert_eq!(config.pool_idle_timeout, Duration::from_secs(5));
    assert_eq!(config.session_buffer_size, 64 * 1024);
    assert_eq!(config.prompt, DEFAULT_PROMPT);
    assert!(config.validate().is_ok());
}

#[test]
fn test_builder_overrides() {
    let config = Config::builder()
        .snapshot_path("/tmp/cache.db")
        .listen_addr("127.0.0.1:11211")
        .pool_min_workers(2)
        .pool_max_workers(16)
        .pool_idle_timeout(Duration::from_millis(250))
        .session_buffer_size(1024)
        .prompt("")
        .build();

    assert_eq!(config.snapshot_path.to_str(), Some("/tmp/cache.db"));
    assert_eq!(config.listen_addr, "127.0.0.1:11211");
    assert_eq!(config.pool_min_workers, 2);
    assert_eq!(config.pool_max_workers, 16);
    assert_eq!(config.pool_idle_timeout, Duration::from_millis(250));
    assert_eq!(config.session_buffer_size, 1024);
    assert!(config.prompt.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_sizing() {
    let zero_max = Config::builder().pool_min_workers(0).pool_max_workers(0).build();
    assert!(matches!(zero_max.validate(), Err(UndisError::Config(_))));

    let inverted = Config::builder().pool_min_workers(5).pool_max_workers(4).build();
    assert!(matches!(inverted.validate(), Err(UndisError::Config(_))));

    let tiny_buffer = Config::builder().session_buffer_size(1).build();
    assert!(matches!(tiny_buffer.validate(), Err(UndisError::Config(_))));
}
