//! Tests for widget configuration persistence.

use voiceplay::{ConfigSource, ConfigStore, VoiceConfig};

fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
    ConfigStore::new(dir.path().join("config.toml"))
}

#[test]
fn test_defaults_when_nothing_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.source(), ConfigSource::Default);
    assert!(store.load_custom().is_none());
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let config = VoiceConfig::new("test-key", "https://example.test/app", "de-DE");

    store.save_custom(&config).unwrap();

    assert_eq!(store.source(), ConfigSource::Custom);
    assert_eq!(store.load_custom(), Some(config.clone()));
    assert_eq!(store.current(), config);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("nested").join("deep").join("config.toml"));

    store
        .save_custom(&VoiceConfig::new("k", "https://example.test", "en-US"))
        .unwrap();
    assert_eq!(store.source(), ConfigSource::Custom);
}

#[test]
fn test_corrupt_file_is_cleared_and_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "this is { not toml").unwrap();

    assert!(store.load_custom().is_none());
    // The corrupt file was removed, not left to fail again.
    assert!(!store.path().exists());
    assert_eq!(store.source(), ConfigSource::Default);
}

#[test]
fn test_incomplete_config_is_cleared() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    std::fs::write(
        store.path(),
        "api_key = \"\"\napp_url = \"\"\nlanguage_code = \"en-US\"\n",
    )
    .unwrap();

    assert!(store.load_custom().is_none());
    assert!(!store.path().exists());
}

#[test]
fn test_clear_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store
        .save_custom(&VoiceConfig::new("k", "https://example.test", "en-US"))
        .unwrap();

    store.clear_custom();
    assert_eq!(store.source(), ConfigSource::Default);

    // Clearing again is a no-op.
    store.clear_custom();
    assert_eq!(store.source(), ConfigSource::Default);
}

#[test]
fn test_default_language_code() {
    let config = VoiceConfig::default();
    assert_eq!(config.language_code(), "en-US");
    assert!(!config.is_complete());
}
