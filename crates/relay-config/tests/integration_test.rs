//! Integration tests for relay-config crate.

use relay_common::test_utils::init_test_logging;
use relay_config::{Config, ConfigLoader, StoreBackend};
use std::path::PathBuf;

#[tokio::test]
async fn test_load_partial_toml() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relay.toml");
    std::fs::write(
        &path,
        r#"
[gateway]
base_url = "http://agent.internal:8000"

[cooldown]
ttl_secs = 600
backend = "sled"
sled_path = "/var/lib/relay/cooldowns"

[commands]
reading_prefix = "/oracle"
"#,
    )
    .unwrap();

    let config = ConfigLoader::new(&path).load().await.unwrap();

    assert_eq!(config.gateway.base_url, "http://agent.internal:8000");
    assert_eq!(config.gateway.chat_connection, "telegram");
    assert_eq!(config.cooldown.ttl_secs, 600);
    assert_eq!(config.cooldown.backend, StoreBackend::Sled);
    assert_eq!(
        config.cooldown.sled_path,
        PathBuf::from("/var/lib/relay/cooldowns")
    );
    assert_eq!(config.commands.reading_prefix, "/oracle");
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn test_load_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relay.yaml");
    std::fs::write(
        &path,
        "server:\n  port: 8443\nwebhook:\n  public_url: https://example.org/api/telegram/hook\n",
    )
    .unwrap();

    let config = ConfigLoader::new(&path).load().await.unwrap();
    assert_eq!(config.server.port, 8443);
    assert_eq!(
        config.webhook.public_url.as_deref(),
        Some("https://example.org/api/telegram/hook")
    );
    assert_eq!(config.webhook.allowed_updates, vec!["message".to_string()]);
}

#[tokio::test]
async fn test_save_then_load_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("relay.toml");
    let loader = ConfigLoader::new(&path);

    let mut config = Config::default();
    config.webhook.secret = Some("fixed-secret".to_string());
    config.cooldown.ttl_secs = 90;
    loader.save(&config).await.unwrap();

    let loaded = loader.load().await.unwrap();
    assert_eq!(loaded, config);

    // No temp files are left next to the target.
    let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::new(dir.path().join("absent.toml")).load().await;
    assert!(matches!(
        result,
        Err(relay_common::ServiceError::Config { .. })
    ));
}

#[tokio::test]
async fn test_invalid_contents_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relay.json");
    std::fs::write(&path, r#"{"server": {"port": "eighty"}}"#).unwrap();

    assert!(ConfigLoader::new(&path).load().await.is_err());
}
