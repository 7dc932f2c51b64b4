/*!
 * Tests for application configuration functionality
 */

use std::collections::HashMap;
use std::fs;

use anyhow::Result;
use tempfile::TempDir;
use topic_relay::app_config::{Config, LogLevel, TransferMode};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.telegram.api_endpoint, "https://api.telegram.org");
    assert_eq!(config.telegram.timeout_secs, 30);
    assert_eq!(config.telegram.max_retries, 3);
    assert_eq!(config.transfer.mode, TransferMode::DirectThenManual);
    assert_eq!(config.transfer.delay_ms, 1500);
    assert_eq!(config.transfer.progress_every, 5);
    assert!(config.transfer.suppress_provenance);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let config = common::test_config();
    assert!(config.validate().is_ok());

    let mut missing_token = config.clone();
    missing_token.telegram.token = "  ".to_string();
    assert!(missing_token.validate().is_err());

    let mut nobody_allowed = config.clone();
    nobody_allowed.authorized_user_ids.clear();
    assert!(nobody_allowed.validate().is_err());

    let mut no_destination = config.clone();
    no_destination.destination_group_id = 0;
    assert!(no_destination.validate().is_err());

    let mut never_report = config.clone();
    never_report.transfer.progress_every = 0;
    assert!(never_report.validate().is_err());
}

#[test]
fn test_manualMode_withoutStagingChat_shouldFailValidation() {
    let mut config = common::test_config();
    config.staging_chat_id = None;
    config.transfer.mode = TransferMode::Manual;
    assert!(config.validate().is_err());

    config.transfer.mode = TransferMode::DirectThenManual;
    assert!(config.validate().is_ok());
    assert_eq!(config.effective_mode(), TransferMode::Direct);
}

#[test]
fn test_applyOverrides_withEnvironmentValues_shouldReplaceFields() -> Result<()> {
    let env: HashMap<&str, &str> = HashMap::from([
        ("TELEGRAM_BOT_TOKEN", "999:from-env"),
        ("AUTHORIZED_USER_IDS", "11, 22"),
        ("SOURCE_CHANNEL_ID", "-100111"),
        ("DESTINATION_GROUP_ID", "-100222"),
        ("DELAY_BETWEEN_FORWARDS", "2.5"),
        ("TRANSFER_MODE", "manual"),
        ("LOG_LEVEL", "debug"),
    ]);
    let mut config = Config::default();
    config.apply_overrides(|key| env.get(key).map(|value| value.to_string()))?;

    assert_eq!(config.telegram.token, "999:from-env");
    assert_eq!(config.authorized_user_ids, vec![11, 22]);
    assert_eq!(config.source_channel_id, -100111);
    assert_eq!(config.destination_group_id, -100222);
    assert_eq!(config.transfer.delay_ms, 2500);
    assert_eq!(config.transfer.mode, TransferMode::Manual);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.is_authorized(22));
    assert!(!config.is_authorized(33));
    Ok(())
}

#[test]
fn test_applyOverrides_invalidUserId_shouldFail() {
    let mut config = Config::default();
    let result = config.apply_overrides(|key| (key == "AUTHORIZED_USER_IDS").then(|| "12,abc".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_config_fromPartialJsonFile_shouldFillDefaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("conf.json");
    fs::write(
        &path,
        r#"{
            "telegram": { "token": "1:x" },
            "authorized_user_ids": [5],
            "source_channel_id": -1001,
            "destination_group_id": -1002,
            "transfer": { "mode": "direct" }
        }"#,
    )?;

    let config: Config = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert!(config.validate().is_ok());
    assert_eq!(config.transfer.mode, TransferMode::Direct);
    assert_eq!(config.transfer.delay_ms, 1500);
    assert_eq!(config.telegram.poll_timeout_secs, 25);
    Ok(())
}

#[test]
fn test_transferMode_fromStr_shouldAcceptAliases() {
    assert_eq!("direct-then-manual".parse::<TransferMode>().unwrap(), TransferMode::DirectThenManual);
    assert_eq!("fallback".parse::<TransferMode>().unwrap(), TransferMode::DirectThenManual);
    assert_eq!("DIRECT".parse::<TransferMode>().unwrap(), TransferMode::Direct);
    assert!("forward".parse::<TransferMode>().is_err());
}
