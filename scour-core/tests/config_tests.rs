// scour-core/tests/config_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use scour_core::{CleanerConfig, HtmlCleaner, ScourError};

#[test]
fn default_config_is_stable_and_nonempty() {
    let config = CleanerConfig::default();
    assert!(config.tags.contains_key("a"));
    assert!(config.tags.contains_key("table"));
    assert!(config.tags["img"].contains("src"));
    assert!(!config.tags.contains_key("script"));
    assert!(!config.tags.contains_key("iframe"));
}

#[test_log::test]
fn load_from_file_round_trips() -> Result<()> {
    let mut config = CleanerConfig::default();
    config
        .tags
        .entry("video".to_string())
        .or_default()
        .insert("src".to_string());

    let file = NamedTempFile::new()?;
    config.save_to_file(file.path())?;
    let loaded = CleanerConfig::load_from_file(file.path())?;

    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn load_from_file_normalizes_case() -> Result<()> {
    let yaml_content = r#"
tags:
  DIV:
    - CLASS
  code: []
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let config = CleanerConfig::load_from_file(file.path())?;

    assert!(config.tags.contains_key("div"));
    assert!(config.tags["div"].contains("class"));
    assert!(config.tags["code"].is_empty());
    Ok(())
}

#[test]
fn load_from_file_rejects_invalid_names() -> Result<()> {
    let yaml_content = r#"
tags:
  "bad tag":
    - href
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;

    let err = CleanerConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ScourError>(),
        Some(ScourError::InvalidConfiguration(_))
    ));
    Ok(())
}

#[test]
fn load_from_file_rejects_malformed_yaml() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"tags: [not, a, map]")?;
    assert!(CleanerConfig::load_from_file(file.path()).is_err());
    Ok(())
}

#[test]
fn cleaner_serializes_as_its_config() -> Result<()> {
    let mut cleaner = HtmlCleaner::new();
    cleaner.add_allowed_tag("video", &["src"]);

    let payload = serde_json::to_string(&cleaner)?;
    let restored: HtmlCleaner = serde_json::from_str(&payload)?;

    assert_eq!(restored, cleaner);
    assert!(restored.is_attribute_allowed("video", "src"));
    Ok(())
}
