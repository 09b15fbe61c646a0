use std::fs;

use sysmon::core::config::MIN_INTERVAL_MS;
use sysmon::core::system_monitor::ProcessSortKey;
use sysmon::MonitorConfig;
use tempfile::TempDir;

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = MonitorConfig {
        interval_ms: 500,
        top_processes: 5,
        sort_by: ProcessSortKey::Memory,
        collect_network: false,
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    assert!(path.exists());
    assert_eq!(MonitorConfig::load_from(&path), config);
}

#[test]
fn test_missing_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = MonitorConfig::load_from(&temp_dir.path().join("absent.json"));
    assert_eq!(config, MonitorConfig::default());
}

#[test]
fn test_save_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let config = MonitorConfig {
        interval_ms: MIN_INTERVAL_MS - 1,
        ..Default::default()
    };
    assert!(config.save_to(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_unknown_fields_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{ "top_processes": 3, "theme": "dark" }"#).unwrap();

    let config = MonitorConfig::load_from(&path);
    assert_eq!(config.top_processes, 3);
    assert_eq!(config.interval_ms, 1000);
}

#[test]
fn test_sort_key_is_stored_lowercase() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let mut config = MonitorConfig::default();
    config.set("sort_by", "name").unwrap();
    config.save_to(&path).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains(r#""sort_by": "name""#));
}

#[test]
fn test_config_path_ends_with_app_dir() {
    if let Ok(path) = MonitorConfig::get_config_path() {
        assert!(path.ends_with("sysmon/config.json"));
    }
}
