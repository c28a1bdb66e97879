//! Configuration loading tests
//!
//! A missing or broken config file must never stop processing: the loader
//! reports the problem and hands back built-in defaults.

use photokw_common::config::{load_or_default, TomlConfig};
use tempfile::TempDir;

#[test]
fn test_load_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
event_prefix = "Happenings"
event_tag_count = 2
keywords_excluded = ["Private"]

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let (config, source) = load_or_default(Some(&path));
    assert_eq!(source.as_deref(), Some(path.as_path()));
    assert_eq!(config.event_prefix, "Happenings");
    assert_eq!(config.event_tag_count, 2);
    assert_eq!(config.keywords_excluded, vec!["Private"]);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.people_prefix, "People");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let (config, source) = load_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
    assert_eq!(source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_unparsable_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "event_prefix = \n[[[").unwrap();

    let (config, _) = load_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_wrong_type_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "update_delay = \"soon\"\n").unwrap();

    let (config, _) = load_or_default(Some(&path));
    assert_eq!(config.update_delay, 5);
}
