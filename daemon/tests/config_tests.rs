use statwatch_daemon::config::Config;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.general.sample_interval_secs, 5);
    assert_eq!(config.general.history_depth, 10);
    assert!(config.process.pids.is_empty());
    assert!(config.process.include_children);
    assert_eq!(config.sample_interval(), Duration::from_secs(5));
}

#[test]
fn test_load_from_toml() {
    let toml_content = r#"
[general]
sample_interval_secs = 2
history_depth = 30

[process]
pids = [1, 4242]
include_children = false

[trend]
rate_warning_percent = 25.0
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml_content.as_bytes()).unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.general.sample_interval_secs, 2);
    assert_eq!(config.general.history_depth, 30);
    assert_eq!(config.process.pids, vec![1, 4242]);
    assert!(!config.process.include_children);
    assert_eq!(config.trend.rate_warning_percent, 25.0);
}

#[test]
fn test_optional_sections_default() {
    let toml_content = r#"
[general]
sample_interval_secs = 1
history_depth = 5
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml_content.as_bytes()).unwrap();
    let config = Config::load(file.path()).unwrap();
    assert!(config.process.include_children);
    assert_eq!(config.trend.rate_warning_percent, 50.0);
}

#[test]
fn test_rejects_unusable_values() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[general]\nsample_interval_secs = 0\nhistory_depth = 10\n").unwrap();
    assert!(Config::load(file.path()).is_err());

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[general]\nsample_interval_secs = 5\nhistory_depth = 1\n").unwrap();
    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_save_config() {
    let mut config = Config::default();
    config.process.pids = vec![7];
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    config.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.process.pids, vec![7]);
    assert_eq!(loaded.general.history_depth, config.general.history_depth);
}
