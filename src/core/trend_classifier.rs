// Multi-timeframe trend fusion

use crate::config::{IndicatorConfig, ProfitConfig, ThresholdConfig};
use crate::core::types::{IndicatorSnapshot, TrendLabel, TrendResult};

/// Directional predicates evaluated per snapshot: RSI extremes, MACD
/// histogram sign, EMA against SMA, close outside the Bollinger bands and
/// Stochastic %K extremes.
pub const SIGNALS_PER_RESOLUTION: usize = 5;

/// Bullish and bearish votes accumulated over every available resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalTally {
    pub bullish: usize,
    pub bearish: usize,
    pub total: usize,
}

impl SignalTally {
    pub fn bullish_confidence(&self) -> f64 {
        Self::percent(self.bullish, self.total)
    }

    pub fn bearish_confidence(&self) -> f64 {
        Self::percent(self.bearish, self.total)
    }

    fn percent(count: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (100.0 * count as f64 / total as f64).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct TrendClassifier {
    indicators: IndicatorConfig,
    thresholds: ThresholdConfig,
    profit: ProfitConfig,
}

impl TrendClassifier {
    pub fn new(indicators: IndicatorConfig, thresholds: ThresholdConfig, profit: ProfitConfig) -> Self {
        Self {
            indicators,
            thresholds,
            profit,
        }
    }

    /// Count directional votes across the given snapshots.
    pub fn tally(&self, snapshots: &[IndicatorSnapshot]) -> SignalTally {
        let cfg = &self.indicators;
        let mut tally = SignalTally::default();

        for snap in snapshots {
            // 1. RSI extremes
            if snap.rsi < cfg.rsi_oversold {
                tally.bullish += 1;
            } else if snap.rsi > cfg.rsi_overbought {
                tally.bearish += 1;
            }

            // 2. MACD histogram sign
            if snap.macd.histogram > 0.0 {
                tally.bullish += 1;
            } else if snap.macd.histogram < 0.0 {
                tally.bearish += 1;
            }

            // 3. EMA vs SMA
            if snap.ema > snap.sma {
                tally.bullish += 1;
            } else if snap.ema < snap.sma {
                tally.bearish += 1;
            }

            // 4. Close outside the bands
            if snap.last_close < snap.bollinger.lower {
                tally.bullish += 1;
            } else if snap.last_close > snap.bollinger.upper {
                tally.bearish += 1;
            }

            // 5. Stochastic extremes
            if snap.stochastic.k < cfg.stochastic_oversold {
                tally.bullish += 1;
            } else if snap.stochastic.k > cfg.stochastic_overbought {
                tally.bearish += 1;
            }

            tally.total += SIGNALS_PER_RESOLUTION;
        }

        tally
    }

    /// Fuse all available snapshots into one classification.
    ///
    /// Thresholds are checked in strict priority: strong bullish, bullish,
    /// strong bearish, bearish. Anything else, including an empty input, is
    /// NEUTRAL at 50%.
    pub fn classify(&self, snapshots: &[IndicatorSnapshot]) -> TrendResult {
        let tally = self.tally(snapshots);
        if tally.total == 0 {
            return TrendResult::neutral();
        }

        let bullish = tally.bullish_confidence();
        let bearish = tally.bearish_confidence();
        let t = &self.thresholds;

        if bullish > t.strong_bullish {
            self.result(TrendLabel::StrongBullish, bullish)
        } else if bullish > t.bullish {
            self.result(TrendLabel::Bullish, bullish)
        } else if bearish > t.strong_bearish {
            self.result(TrendLabel::StrongBearish, bearish)
        } else if bearish > t.bearish {
            self.result(TrendLabel::Bearish, bearish)
        } else {
            TrendResult::neutral()
        }
    }

    fn result(&self, label: TrendLabel, confidence_percent: f64) -> TrendResult {
        TrendResult {
            label,
            confidence_percent,
            suggested_profit_percent: self.suggested_profit(label),
        }
    }

    /// Only bullish labels carry a profit target.
    pub fn suggested_profit(&self, label: TrendLabel) -> f64 {
        match label {
            TrendLabel::StrongBullish => self.profit.strong_bullish,
            TrendLabel::Bullish => self.profit.bullish,
            TrendLabel::Neutral | TrendLabel::Bearish | TrendLabel::StrongBearish => 0.0,
        }
    }
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self::new(
            IndicatorConfig::default(),
            ThresholdConfig::default(),
            ProfitConfig::default(),
        )
    }
}
