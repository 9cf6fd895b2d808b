/*!
 * Tests for configuration loading, saving and validation
 */

use std::fs;

use jatoko::app_config::{Config, LogLevel, TranslationProvider};

use crate::common::{create_temp_dir, create_test_file, mock_config};

#[test]
fn test_config_saveThenLoad_shouldKeepValues() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    let mut config = mock_config();
    config.batch.concurrent_files = 4;
    config.log_level = LogLevel::Debug;

    config.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.translation.provider, TranslationProvider::Mock);
    assert_eq!(loaded.batch.concurrent_files, 4);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    assert!(fs::read_to_string(&path).unwrap().contains("\"output_suffix\": \"_translated\""));
}

#[test]
fn test_config_fromFile_withMinimalJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{ "translation": { "provider": "deepl", "api_key": "key:fx" } }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "ko");
    assert_eq!(config.translation.chunk_size, 50);
    assert_eq!(config.batch.output_suffix, "_translated");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_fromFile_withInvalidJson_shouldFailWithContext() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(dir.path(), "conf.json", "{ nope").unwrap();

    let error = Config::from_file(&path).unwrap_err();

    assert!(format!("{:#}", error).contains("Failed to parse config file"));
}

#[test]
fn test_validate_withZeroChunkSize_shouldFail() {
    let mut config = mock_config();
    config.translation.chunk_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withUnknownLanguage_shouldFail() {
    let mut config = mock_config();
    config.source_language = "xx".to_string();
    assert!(config.validate().is_err());
}
