// Configuration management for the trend signal bot

use crate::core::types::Resolution;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Initial watch list; the database copy takes over once it has entries.
    #[serde(default)]
    pub instruments: Vec<String>,
    pub resolutions: Vec<Resolution>,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_candle_count")]
    pub candle_count: usize,
    #[serde(default = "default_min_candles")]
    pub min_candles: usize,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_notification_delay_ms")]
    pub notification_delay_ms: u64,
    #[serde(default = "default_io_timeout_seconds")]
    pub io_timeout_seconds: u64,
}

impl ScanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn notification_delay(&self) -> Duration {
        Duration::from_millis(self.notification_delay_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_seconds)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            instruments: vec!["XBTUSD".to_string(), "ETHUSD".to_string()],
            resolutions: vec![
                Resolution::FifteenMinutes,
                Resolution::OneHour,
                Resolution::FourHours,
            ],
            interval_seconds: default_interval_seconds(),
            candle_count: default_candle_count(),
            min_candles: default_min_candles(),
            request_delay_ms: default_request_delay_ms(),
            notification_delay_ms: default_notification_delay_ms(),
            io_timeout_seconds: default_io_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
    #[serde(default = "default_ema_period")]
    pub ema_period: usize,
    #[serde(default = "default_sma_period")]
    pub sma_period: usize,
    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,
    #[serde(default = "default_bollinger_std_dev")]
    pub bollinger_std_dev: f64,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    #[serde(default = "default_stochastic_period")]
    pub stochastic_period: usize,
    #[serde(default = "default_stochastic_smoothing")]
    pub stochastic_k: usize,
    #[serde(default = "default_stochastic_smoothing")]
    pub stochastic_d: usize,
    #[serde(default = "default_stochastic_oversold")]
    pub stochastic_oversold: f64,
    #[serde(default = "default_stochastic_overbought")]
    pub stochastic_overbought: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            ema_period: default_ema_period(),
            sma_period: default_sma_period(),
            bollinger_period: default_bollinger_period(),
            bollinger_std_dev: default_bollinger_std_dev(),
            atr_period: default_atr_period(),
            stochastic_period: default_stochastic_period(),
            stochastic_k: default_stochastic_smoothing(),
            stochastic_d: default_stochastic_smoothing(),
            stochastic_oversold: default_stochastic_oversold(),
            stochastic_overbought: default_stochastic_overbought(),
        }
    }
}

/// Confidence percentages a side must exceed for each label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_strong_threshold")]
    pub strong_bullish: f64,
    #[serde(default = "default_threshold")]
    pub bullish: f64,
    #[serde(default = "default_strong_threshold")]
    pub strong_bearish: f64,
    #[serde(default = "default_threshold")]
    pub bearish: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            strong_bullish: default_strong_threshold(),
            bullish: default_threshold(),
            strong_bearish: default_strong_threshold(),
            bearish: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitConfig {
    #[serde(default = "default_strong_bullish_profit")]
    pub strong_bullish: f64,
    #[serde(default = "default_bullish_profit")]
    pub bullish: f64,
}

impl Default for ProfitConfig {
    fn default() -> Self {
        Self {
            strong_bullish: default_strong_bullish_profit(),
            bullish: default_bullish_profit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    #[serde(default = "default_atr_multiplier")]
    pub atr_multiplier: f64,
    #[serde(default = "default_trailing_percent")]
    pub trailing_percent: f64,
    #[serde(default = "default_risk_reward_ratio")]
    pub risk_reward_ratio: f64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            atr_multiplier: default_atr_multiplier(),
            trailing_percent: default_trailing_percent(),
            risk_reward_ratio: default_risk_reward_ratio(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrakenConfig {
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_max_calls_per_minute")]
    pub max_calls_per_minute: u32,
}

impl Default for KrakenConfig {
    fn default() -> Self {
        Self {
            rest_url: default_rest_url(),
            max_calls_per_minute: default_max_calls_per_minute(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_url")]
    pub api_url: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: default_telegram_url(),
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

impl TelegramConfig {
    /// Credentials from the environment win over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            if !token.is_empty() {
                self.bot_token = token;
            }
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            if !chat_id.is_empty() {
                self.chat_id = chat_id;
            }
        }
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// `{instrument}` is replaced with the watched identifier.
    #[serde(default = "default_chart_url_template")]
    pub chart_url_template: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            chart_url_template: default_chart_url_template(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub scan: ScanConfig,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub profit: ProfitConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub kraken: KrakenConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

// Default value functions
fn default_interval_seconds() -> u64 { 300 }
fn default_candle_count() -> usize { 100 }
fn default_min_candles() -> usize { 50 }
fn default_request_delay_ms() -> u64 { 500 }
fn default_notification_delay_ms() -> u64 { 1000 }
fn default_io_timeout_seconds() -> u64 { 15 }
fn default_rsi_period() -> usize { 14 }
fn default_rsi_oversold() -> f64 { 30.0 }
fn default_rsi_overbought() -> f64 { 70.0 }
fn default_macd_fast() -> usize { 12 }
fn default_macd_slow() -> usize { 26 }
fn default_macd_signal() -> usize { 9 }
fn default_ema_period() -> usize { 20 }
fn default_sma_period() -> usize { 50 }
fn default_bollinger_period() -> usize { 20 }
fn default_bollinger_std_dev() -> f64 { 2.0 }
fn default_atr_period() -> usize { 14 }
fn default_stochastic_period() -> usize { 14 }
fn default_stochastic_smoothing() -> usize { 3 }
fn default_stochastic_oversold() -> f64 { 20.0 }
fn default_stochastic_overbought() -> f64 { 80.0 }
fn default_strong_threshold() -> f64 { 70.0 }
fn default_threshold() -> f64 { 50.0 }
fn default_strong_bullish_profit() -> f64 { 5.0 }
fn default_bullish_profit() -> f64 { 3.0 }
fn default_atr_multiplier() -> f64 { 1.5 }
fn default_trailing_percent() -> f64 { 0.5 }
fn default_risk_reward_ratio() -> f64 { 2.0 }
fn default_rest_url() -> String { "https://api.kraken.com".to_string() }
fn default_max_calls_per_minute() -> u32 { 60 }
fn default_telegram_url() -> String { "https://api.telegram.org".to_string() }
fn default_chart_url_template() -> String {
    "https://www.tradingview.com/chart/?symbol=KRAKEN:{instrument}".to_string()
}
fn default_log_level() -> String { "info".to_string() }
fn default_db_path() -> String { "data/trend_bot.db".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            info!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scan = &self.scan;
        if scan.resolutions.is_empty() {
            return Err(ConfigError::Validation("scan.resolutions must not be empty".to_string()));
        }

        if scan.interval_seconds == 0 {
            return Err(ConfigError::Validation("scan.interval_seconds must be greater than 0".to_string()));
        }

        if scan.io_timeout_seconds == 0 {
            return Err(ConfigError::Validation("scan.io_timeout_seconds must be greater than 0".to_string()));
        }

        if scan.min_candles < 2 {
            return Err(ConfigError::Validation("scan.min_candles must be at least 2".to_string()));
        }

        if scan.min_candles > scan.candle_count {
            return Err(ConfigError::Validation(format!(
                "scan.min_candles ({}) must not exceed scan.candle_count ({})",
                scan.min_candles, scan.candle_count
            )));
        }

        let ind = &self.indicators;
        let periods = [
            ("rsi_period", ind.rsi_period),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
            ("ema_period", ind.ema_period),
            ("sma_period", ind.sma_period),
            ("bollinger_period", ind.bollinger_period),
            ("atr_period", ind.atr_period),
            ("stochastic_period", ind.stochastic_period),
            ("stochastic_k", ind.stochastic_k),
            ("stochastic_d", ind.stochastic_d),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(ConfigError::Validation(format!("indicators.{} must be greater than 0", name)));
            }
        }

        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::Validation("indicators.macd_fast must be less than macd_slow".to_string()));
        }

        if ind.bollinger_std_dev <= 0.0 {
            return Err(ConfigError::Validation("indicators.bollinger_std_dev must be positive".to_string()));
        }

        if ind.rsi_oversold >= ind.rsi_overbought {
            return Err(ConfigError::Validation("indicators.rsi_oversold must be below rsi_overbought".to_string()));
        }

        if ind.stochastic_oversold >= ind.stochastic_overbought {
            return Err(ConfigError::Validation(
                "indicators.stochastic_oversold must be below stochastic_overbought".to_string(),
            ));
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("strong_bullish", t.strong_bullish),
            ("bullish", t.bullish),
            ("strong_bearish", t.strong_bearish),
            ("bearish", t.bearish),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Validation(format!("thresholds.{} must be within 0-100", name)));
            }
        }

        if self.profit.strong_bullish < 0.0 || self.profit.bullish < 0.0 {
            return Err(ConfigError::Validation("profit percentages must be non-negative".to_string()));
        }

        if self.exit.atr_multiplier <= 0.0 {
            return Err(ConfigError::Validation("exit.atr_multiplier must be positive".to_string()));
        }

        if self.exit.trailing_percent <= 0.0 {
            return Err(ConfigError::Validation("exit.trailing_percent must be positive".to_string()));
        }

        if self.exit.risk_reward_ratio <= 0.0 {
            return Err(ConfigError::Validation("exit.risk_reward_ratio must be positive".to_string()));
        }

        if self.kraken.max_calls_per_minute == 0 {
            return Err(ConfigError::Validation("kraken.max_calls_per_minute must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_resolutions() {
        let mut config = Config::default();
        config.scan.resolutions.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_inverted_macd_periods() {
        let mut config = Config::default();
        config.indicators.macd_fast = 26;
        config.indicators.macd_slow = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scan]
            resolutions = ["5m", "1h"]
            "#,
        )
        .unwrap();
        assert_eq!(config.scan.resolutions, vec![Resolution::FiveMinutes, Resolution::OneHour]);
        assert_eq!(config.scan.min_candles, 50);
        assert_eq!(config.indicators.rsi_period, 14);
        assert_eq!(config.exit.atr_multiplier, 1.5);
        assert!(config.scan.instruments.is_empty());
    }
}
