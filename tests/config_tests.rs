// Configuration file handling tests

mod common;

use common::create_temp_db_dir;
use trend_signal_bot::{Config, ConfigError, Resolution};

#[test]
fn test_example_config_is_valid() {
    let config: Config = toml::from_str(include_str!("../config.toml.example")).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.scan.resolutions.len(), 3);
    assert_eq!(config.scan.instruments, vec!["XBTUSD", "ETHUSD"]);
}

#[test]
fn test_save_and_load_roundtrip_preserves_values() {
    let (_dir, db_path) = create_temp_db_dir();
    let path = db_path.with_file_name("config.toml");

    let mut config = Config::default();
    config.scan.resolutions = vec![Resolution::FiveMinutes, Resolution::OneDay];
    config.exit.risk_reward_ratio = 3.0;
    config.to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.scan.resolutions, vec![Resolution::FiveMinutes, Resolution::OneDay]);
    assert_eq!(loaded.exit.risk_reward_ratio, 3.0);
}

#[test]
fn test_load_or_create_writes_default() {
    let (dir, _) = create_temp_db_dir();
    let path = dir.path().join("fresh.toml");

    let config = Config::load_or_create(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.scan.interval_seconds, 300);
}

#[test]
fn test_invalid_file_is_rejected() {
    let (dir, _) = create_temp_db_dir();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
        [scan]
        resolutions = ["1h"]
        min_candles = 200
        candle_count = 100
        "#,
    )
    .unwrap();

    assert!(matches!(Config::from_file(&path), Err(ConfigError::Validation(_))));
}

#[test]
fn test_unknown_resolution_fails_to_parse() {
    let (dir, _) = create_temp_db_dir();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[scan]\nresolutions = [\"7m\"]\n").unwrap();

    assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_missing_file_is_read_error() {
    assert!(matches!(
        Config::from_file("/nonexistent/trend-bot.toml"),
        Err(ConfigError::FileRead(_))
    ));
}
