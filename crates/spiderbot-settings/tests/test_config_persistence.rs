use spiderbot_communication::BaudRate;
use spiderbot_core::OverflowPolicy;
use spiderbot_settings::{Config, SettingsError};
use std::path::PathBuf;
use tempfile::TempDir;

fn sample() -> Config {
    let mut config = Config::default();
    config.connection.port = "/dev/ttyACM0".to_string();
    config.connection.baud_rate = BaudRate::B115200;
    config.connection.auto_connect = true;
    config.poll.history_len = 80;
    config.frames.capacity = 3;
    config.frames.overflow = OverflowPolicy::DropIncoming;
    config.snapshot.directory = PathBuf::from("captures");
    config
}

#[test]
fn test_json_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let config = sample();
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_toml_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let config = sample();
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("spiderbot").join("config.json");

    Config::default().save_to_file(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[connection]\nport = \"COM3\"\nbaud_rate = 38400\n").unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.connection.port, "COM3");
    assert_eq!(loaded.connection.baud_rate, BaudRate::B38400);
    assert_eq!(loaded.connection.read_timeout_ms, 1000);
    assert_eq!(loaded.poll.interval_ms, 30);
    assert_eq!(loaded.frames.overflow, OverflowPolicy::EvictOldest);
}

#[test]
fn test_unsupported_baud_rate_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"connection": {"baud_rate": 57600}}"#).unwrap();

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::JsonError(_))
    ));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"frames": {"capacity": 0}}"#).unwrap();

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::InvalidSetting { .. })
    ));
}

#[test]
fn test_load_or_default_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.json");

    assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
}

#[test]
fn test_default_path_under_app_dir() {
    if let Ok(path) = Config::default_path() {
        assert!(path.ends_with("spiderbot/config.json"));
    }
}
