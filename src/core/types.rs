// Common types used across the analysis pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One OHLCV interval. Sequences are ordered oldest to newest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle aggregation interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
}

impl Resolution {
    pub const ALL: [Resolution; 8] = [
        Resolution::OneMinute,
        Resolution::FiveMinutes,
        Resolution::FifteenMinutes,
        Resolution::ThirtyMinutes,
        Resolution::OneHour,
        Resolution::FourHours,
        Resolution::OneDay,
        Resolution::OneWeek,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            Resolution::OneMinute => 1,
            Resolution::FiveMinutes => 5,
            Resolution::FifteenMinutes => 15,
            Resolution::ThirtyMinutes => 30,
            Resolution::OneHour => 60,
            Resolution::FourHours => 240,
            Resolution::OneDay => 1440,
            Resolution::OneWeek => 10080,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Resolution::OneMinute => "1m",
            Resolution::FiveMinutes => "5m",
            Resolution::FifteenMinutes => "15m",
            Resolution::ThirtyMinutes => "30m",
            Resolution::OneHour => "1h",
            Resolution::FourHours => "4h",
            Resolution::OneDay => "1d",
            Resolution::OneWeek => "1w",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Resolution::ALL
            .iter()
            .copied()
            .find(|r| r.label() == wanted)
            .ok_or_else(|| format!("unknown resolution '{}' (expected one of 1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w)", s))
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.label().to_string()
    }
}

/// Categorical trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendLabel {
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    StrongBearish,
}

impl TrendLabel {
    pub fn is_bullish(&self) -> bool {
        matches!(self, TrendLabel::StrongBullish | TrendLabel::Bullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, TrendLabel::StrongBearish | TrendLabel::Bearish)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::StrongBullish => "STRONG_BULLISH",
            TrendLabel::Bullish => "BULLISH",
            TrendLabel::Neutral => "NEUTRAL",
            TrendLabel::Bearish => "BEARISH",
            TrendLabel::StrongBearish => "STRONG_BEARISH",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRONG_BULLISH" => Ok(TrendLabel::StrongBullish),
            "BULLISH" => Ok(TrendLabel::Bullish),
            "NEUTRAL" => Ok(TrendLabel::Neutral),
            "BEARISH" => Ok(TrendLabel::Bearish),
            "STRONG_BEARISH" => Ok(TrendLabel::StrongBearish),
            other => Err(format!("unknown trend label '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticValue {
    pub k: f64,
    pub d: f64,
}

/// Indicator values for one instrument/resolution/cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub resolution: Resolution,
    pub last_close: f64,
    pub rsi: f64,
    pub macd: MacdValue,
    pub ema: f64,
    pub sma: f64,
    pub bollinger: BollingerBands,
    pub atr: f64,
    pub stochastic: StochasticValue,
}

/// Fused classification for one cycle. Stateless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub label: TrendLabel,
    pub confidence_percent: f64,
    pub suggested_profit_percent: f64,
}

impl TrendResult {
    pub fn neutral() -> Self {
        Self {
            label: TrendLabel::Neutral,
            confidence_percent: 50.0,
            suggested_profit_percent: 0.0,
        }
    }
}

/// Reference price levels derived from the latest close and ATR. Not stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: f64,
    pub reward_target: f64,
    pub atr_value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairState {
    pub instrument: String,
    pub last_label: TrendLabel,
}
