/*!
 * Tests for application configuration functionality
 */

use tubelingo::app_config::{Config, LogLevel, TranslatorMode};

use crate::common;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "ja");
    assert_eq!(config.translator.mode, TranslatorMode::Server);
    assert_eq!(config.translator.binary, "plamo-translate");
    assert_eq!(config.translator.max_tokens, 7000);
    assert_eq!(config.translator.source_tag, "plamo");
    assert_eq!(config.whisper.model, "base");
    assert_eq!(config.ytdlp.binary, "yt-dlp");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.database_path.is_none());
}

/// Test configuration validation
#[test]
fn test_configValidation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());

    config.source_language = "en".to_string();
    config.target_language = "eng".to_string();
    assert!(config.validate().is_err(), "eng and en are the same language");

    config.target_language = "fr".to_string();
    config.translator.max_tokens = -1;
    assert!(config.validate().is_err());

    config.translator.max_tokens = 100;
    config.whisper.binary = "  ".to_string();
    assert!(config.validate().is_err());

    config.whisper.binary = "whisper".to_string();
    config.whisper.language = Some("zz".to_string());
    assert!(config.validate().is_err());

    config.whisper.language = Some("en".to_string());
    assert!(config.validate().is_ok());
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("tubelingo.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config.target_language, "ja");

    let reloaded = Config::load_or_create(&path).unwrap();
    assert_eq!(reloaded.translator.max_tokens, config.translator.max_tokens);
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "partial.json",
        r#"{"target_language": "fr", "translator": {"mode": "simple", "max_tokens": 500}}"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.translator.mode, TranslatorMode::Simple);
    assert_eq!(config.translator.max_tokens, 500);
    assert_eq!(config.translator.binary, "plamo-translate");
}

#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "broken.json", "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

#[test]
fn test_resolveDatabasePath_withExplicitPath_shouldUseIt() {
    let config = Config {
        database_path: Some("/tmp/custom.db".to_string()),
        ..Config::default()
    };

    assert_eq!(config.resolve_database_path().unwrap(), std::path::PathBuf::from("/tmp/custom.db"));
}

#[test]
fn test_logLevel_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Debug.to_level_filter(), log::LevelFilter::Debug);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
