// Exit reference levels from the latest close and ATR

use crate::config::ExitConfig;
use crate::core::types::ExitLevels;

/// Derives stop, trailing and target prices. No clamping: a tiny ATR or an
/// odd multiplier can produce nonsensical levels and callers decide how to
/// display them.
#[derive(Debug, Clone)]
pub struct ExitLevelCalculator {
    config: ExitConfig,
}

impl ExitLevelCalculator {
    pub fn new(config: ExitConfig) -> Self {
        Self { config }
    }

    pub fn calculate(&self, close: f64, atr: f64, profit_percent: f64) -> ExitLevels {
        let stop_loss = close - atr * self.config.atr_multiplier;
        ExitLevels {
            entry: close,
            stop_loss,
            take_profit: close * (1.0 + profit_percent / 100.0),
            trailing_stop: close * (1.0 - self.config.trailing_percent / 100.0),
            reward_target: close + (close - stop_loss) * self.config.risk_reward_ratio,
            atr_value: atr,
        }
    }
}

impl Default for ExitLevelCalculator {
    fn default() -> Self {
        Self::new(ExitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_reference_levels() {
        let calc = ExitLevelCalculator::new(ExitConfig {
            atr_multiplier: 1.5,
            trailing_percent: 0.5,
            risk_reward_ratio: 2.0,
        });
        let levels = calc.calculate(100.0, 2.0, 3.0);

        assert!((levels.entry - 100.0).abs() < EPS);
        assert!((levels.stop_loss - 97.0).abs() < EPS);
        assert!((levels.take_profit - 103.0).abs() < EPS);
        assert!((levels.trailing_stop - 99.5).abs() < EPS);
        assert!((levels.reward_target - 106.0).abs() < EPS);
        assert!((levels.atr_value - 2.0).abs() < EPS);
    }

    #[test]
    fn test_no_clamping_on_large_atr() {
        let levels = ExitLevelCalculator::default().calculate(1.0, 10.0, 0.0);
        assert!(levels.stop_loss < 0.0);
        assert_eq!(levels.take_profit, 1.0);
    }
}
