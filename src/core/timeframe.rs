// Per-resolution candle retrieval and indicator snapshot

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::clients::provider::{CandleProvider, ProviderError};
use crate::config::IndicatorConfig;
use crate::core::indicators;
use crate::core::types::{Candle, IndicatorSnapshot, Resolution};

/// Result of analysing one resolution. Only `Ready` feeds the classifier;
/// the other variants are skips, not errors.
#[derive(Debug)]
pub enum SnapshotOutcome {
    Ready(IndicatorSnapshot),
    Unavailable(ProviderError),
    Insufficient { received: usize, required: usize },
}

impl SnapshotOutcome {
    pub fn into_snapshot(self) -> Option<IndicatorSnapshot> {
        match self {
            SnapshotOutcome::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SnapshotOutcome::Ready(_))
    }
}

#[derive(Clone)]
pub struct TimeframeAnalyzer {
    provider: Arc<dyn CandleProvider>,
    indicators: IndicatorConfig,
    candle_count: usize,
    min_candles: usize,
    io_timeout: Duration,
}

impl TimeframeAnalyzer {
    pub fn new(
        provider: Arc<dyn CandleProvider>,
        indicators: IndicatorConfig,
        candle_count: usize,
        min_candles: usize,
        io_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            indicators,
            candle_count,
            min_candles,
            io_timeout,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetch candles for one resolution and build its snapshot.
    ///
    /// Throttling waits happen before the timeout starts.
    pub async fn analyze(&self, instrument: &str, resolution: Resolution) -> SnapshotOutcome {
        self.provider.wait_ready().await;

        let fetch = self
            .provider
            .fetch_candles(instrument, resolution, self.candle_count);

        let candles = match timeout(self.io_timeout, fetch).await {
            Ok(Ok(candles)) => candles,
            Ok(Err(e)) => {
                warn!(instrument, %resolution, error = %e, "candle fetch failed, skipping resolution");
                return SnapshotOutcome::Unavailable(e);
            }
            Err(_) => {
                let secs = self.io_timeout.as_secs();
                warn!(instrument, %resolution, timeout_secs = secs, "candle fetch timed out, skipping resolution");
                return SnapshotOutcome::Unavailable(ProviderError::Timeout(secs));
            }
        };

        if candles.len() < self.min_candles {
            warn!(
                instrument,
                %resolution,
                received = candles.len(),
                required = self.min_candles,
                "not enough candles, skipping resolution"
            );
            return SnapshotOutcome::Insufficient {
                received: candles.len(),
                required: self.min_candles,
            };
        }

        match build_snapshot(resolution, &candles, &self.indicators) {
            Some(snapshot) => {
                debug!(
                    instrument,
                    %resolution,
                    close = snapshot.last_close,
                    rsi = snapshot.rsi,
                    histogram = snapshot.macd.histogram,
                    "snapshot ready"
                );
                SnapshotOutcome::Ready(snapshot)
            }
            // Periods longer than the window cannot be evaluated.
            None => SnapshotOutcome::Insufficient {
                received: candles.len(),
                required: required_candles(&self.indicators).max(self.min_candles),
            },
        }
    }
}

/// Smallest window every configured indicator can be evaluated on.
pub fn required_candles(cfg: &IndicatorConfig) -> usize {
    [
        cfg.rsi_period + 1,
        cfg.macd_slow,
        cfg.ema_period,
        cfg.sma_period,
        cfg.bollinger_period,
        cfg.atr_period + 1,
        cfg.stochastic_period + cfg.stochastic_k + cfg.stochastic_d - 2,
    ]
    .into_iter()
    .max()
    .unwrap_or(1)
}

/// Compute every indicator on an ordered candle window.
///
/// `last_close` is always the close of the final candle in `candles`.
pub fn build_snapshot(
    resolution: Resolution,
    candles: &[Candle],
    cfg: &IndicatorConfig,
) -> Option<IndicatorSnapshot> {
    let last_close = candles.last()?.close;
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    Some(IndicatorSnapshot {
        resolution,
        last_close,
        rsi: indicators::rsi(&closes, cfg.rsi_period)?,
        macd: indicators::macd(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal)?,
        ema: indicators::ema_last(&closes, cfg.ema_period)?,
        sma: indicators::sma_last(&closes, cfg.sma_period)?,
        bollinger: indicators::bollinger(&closes, cfg.bollinger_period, cfg.bollinger_std_dev)?,
        atr: indicators::atr(candles, cfg.atr_period)?,
        stochastic: indicators::stochastic(
            candles,
            cfg.stochastic_period,
            cfg.stochastic_k,
            cfg.stochastic_d,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn rising_candles(count: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let close = 100.0 + i as f64;
                Candle {
                    timestamp: start + ChronoDuration::hours(i as i64),
                    open: close - 0.5,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 10.0,
                }
            })
            .collect()
    }

    struct FixedProvider(Result<Vec<Candle>, ()>);

    #[async_trait]
    impl CandleProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_candles(
            &self,
            _instrument: &str,
            _resolution: Resolution,
            _count: usize,
        ) -> Result<Vec<Candle>, ProviderError> {
            self.0
                .clone()
                .map_err(|_| ProviderError::UnknownInstrument("NOPE".to_string()))
        }

        async fn list_instruments(&self) -> Result<Vec<String>, ProviderError> {
            Ok(vec!["XBTUSD".to_string()])
        }
    }

    fn analyzer(provider: FixedProvider) -> TimeframeAnalyzer {
        TimeframeAnalyzer::new(
            Arc::new(provider),
            IndicatorConfig::default(),
            100,
            50,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_snapshot_last_close_matches_final_candle() {
        let candles = rising_candles(100);
        let snap = build_snapshot(Resolution::OneHour, &candles, &IndicatorConfig::default()).unwrap();
        assert_eq!(snap.last_close, candles[99].close);
        assert_eq!(snap.resolution, Resolution::OneHour);
        assert!(snap.ema > snap.sma);
        assert!(snap.atr > 0.0);
    }

    #[test]
    fn test_required_candles_defaults() {
        assert_eq!(required_candles(&IndicatorConfig::default()), 50);
    }

    #[tokio::test]
    async fn test_short_history_is_skipped() {
        let outcome = analyzer(FixedProvider(Ok(rising_candles(49))))
            .analyze("XBTUSD", Resolution::OneHour)
            .await;
        assert!(matches!(
            outcome,
            SnapshotOutcome::Insufficient { received: 49, required: 50 }
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_is_skipped() {
        let outcome = analyzer(FixedProvider(Err(())))
            .analyze("NOPE", Resolution::OneHour)
            .await;
        assert!(matches!(
            outcome,
            SnapshotOutcome::Unavailable(ProviderError::UnknownInstrument(_))
        ));
        assert!(outcome.into_snapshot().is_none());
    }

    #[tokio::test]
    async fn test_enough_history_is_ready() {
        let outcome = analyzer(FixedProvider(Ok(rising_candles(100))))
            .analyze("XBTUSD", Resolution::OneHour)
            .await;
        assert!(outcome.is_ready());
    }
}
