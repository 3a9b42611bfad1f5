// Common test utilities and helpers
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use std::path::PathBuf;

use trend_signal_bot::clients::{ActionLink, CandleProvider, Notifier, NotifyError, ProviderError};
use trend_signal_bot::{
    Candle, Config, PairStateStore, Resolution, ScanOrchestrator, WatchList,
};

/// Single-resolution config with zero pacing.
///
/// On a steady uptrend MACD and EMA/SMA vote bullish while RSI and %K vote
/// bearish, so bullish confidence is 40% and the 30% threshold labels it BULLISH.
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.scan.instruments = vec!["XBTUSD".to_string(), "ETHUSD".to_string()];
    config.scan.resolutions = vec![Resolution::OneHour];
    config.scan.request_delay_ms = 0;
    config.scan.notification_delay_ms = 0;
    config.scan.io_timeout_seconds = 5;
    config.thresholds.strong_bullish = 90.0;
    config.thresholds.bullish = 30.0;
    config.telegram.chat_id = "test-chat".to_string();
    config.alerts.chart_url_template = "https://charts.test/{instrument}".to_string();
    config
}

/// Create a temporary directory for test databases
pub fn create_temp_db_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    (temp_dir, db_path)
}

/// Hourly candles with close = 100 + i and a one-point range.
pub fn rising_candles(count: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let close = 100.0 + i as f64;
            Candle {
                timestamp: start + ChronoDuration::hours(i as i64),
                open: close - 0.25,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1.0,
            }
        })
        .collect()
}

/// Serves the same candles for every request, except for instruments marked failing.
pub struct MockProvider {
    candles: Vec<Candle>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            failing: HashSet::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_for(mut self, instrument: &str) -> Self {
        self.failing.insert(instrument.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandleProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_candles(
        &self,
        instrument: &str,
        _resolution: Resolution,
        _count: usize,
    ) -> Result<Vec<Candle>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(instrument) {
            return Err(ProviderError::UnknownInstrument(instrument.to_string()));
        }
        Ok(self.candles.clone())
    }

    async fn list_instruments(&self) -> Result<Vec<String>, ProviderError> {
        let mut instruments = vec!["ETHUSD".to_string(), "SOLUSD".to_string(), "XBTUSD".to_string()];
        instruments.retain(|i| !self.failing.contains(i));
        Ok(instruments)
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub target: String,
    pub message: String,
    pub links: Vec<ActionLink>,
}

/// Records every send; optionally rejects them all.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, target: &str, message: &str, links: &[ActionLink]) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentMessage {
            target: target.to_string(),
            message: message.to_string(),
            links: links.to_vec(),
        });
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 400,
                description: "chat not found".to_string(),
            });
        }
        Ok(())
    }
}

/// Orchestrator over the config's instruments with fresh state.
pub fn create_orchestrator(
    config: &Config,
    provider: Arc<MockProvider>,
    notifier: Arc<RecordingNotifier>,
) -> ScanOrchestrator {
    ScanOrchestrator::new(
        config,
        provider,
        notifier,
        WatchList::from_instruments(&config.scan.instruments),
        PairStateStore::new(),
    )
}
