/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use std::time::Duration;

use readalong::app_config::{Config, LogLevel};
use readalong::session::SessionConfig;

use crate::common;

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.target_language, "zh");

    // Second load reads the file it just wrote
    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.narration, config.narration);
    assert_eq!(reloaded.sync.tick_interval_ms, 33);
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldKeepOverrides() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{ "log_level": "debug", "alignment": { "tolerance_secs": 0.8 }, "narration": { "enabled_by_default": true } }"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.alignment.tolerance_secs, 0.8);
    assert!(config.narration.enabled_by_default);
    assert_eq!(config.narration.speech_locale, "zh-CN");
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_validate_withBadLanguageOrGap_shouldFail() {
    let mut config = Config::default();
    config.source_language = "english".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.parser.fragment_gap_secs = -1.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_session_config_from_config_shouldCarryNarrationSettings() {
    let mut config = Config::default();
    config.narration.speak_delay_ms = 250;
    config.narration.pre_trigger_secs = 0.5;
    config.alignment.tolerance_secs = 0.3;
    config.sync.offset_step_secs = 0.25;

    let session = SessionConfig::from_config(&config);
    assert_eq!(session.narration.speak_delay, Duration::from_millis(250));
    assert_eq!(session.narration.pre_trigger_secs, 0.5);
    assert_eq!(session.narration.locale, "zh-CN");
    assert_eq!(session.load.alignment_tolerance_secs, 0.3);
    assert!(!session.narration_enabled);
    assert_eq!(session.offset_step_secs, 0.25);
}
