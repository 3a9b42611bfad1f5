//! Scan orchestration
//!
//! One cycle walks the watch list in order. For every instrument each
//! configured resolution is analysed in turn, the snapshots are fused into a
//! label, the state store decides whether the label is alert-worthy, and a
//! formatted alert goes out through the notifier. A failing instrument is
//! logged and the cycle moves on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::clients::notifier::{Notifier, NotifyError};
use crate::clients::provider::CandleProvider;
use crate::config::{Config, ScanConfig};
use crate::core::alert::{chart_links, TrendAlert};
use crate::core::exit_levels::ExitLevelCalculator;
use crate::core::state_tracker::PairStateStore;
use crate::core::timeframe::{SnapshotOutcome, TimeframeAnalyzer};
use crate::core::trend_classifier::TrendClassifier;
use crate::core::types::{ExitLevels, IndicatorSnapshot, Resolution, TrendResult};
use crate::core::watch_list::WatchList;
use crate::db::Database;
use crate::error::{BotError, BotResult};

/// Summary of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub instruments: usize,
    /// Instruments whose label was recorded, including NEUTRAL fallbacks.
    pub classified: usize,
    pub alerts_sent: usize,
    pub notification_failures: usize,
    /// Instruments that errored or had no usable resolution.
    pub failures: usize,
    /// Set when the cycle did not run because another was in progress.
    pub skipped: bool,
}

impl CycleReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Everything computed for one instrument in one cycle.
#[derive(Debug, Clone)]
pub struct InstrumentAnalysis {
    pub instrument: String,
    pub snapshots: Vec<IndicatorSnapshot>,
    /// Resolutions that produced no snapshot, with the reason.
    pub skipped: Vec<(Resolution, String)>,
    pub trend: TrendResult,
}

impl InstrumentAnalysis {
    /// Snapshot exit levels are derived from: the first configured resolution
    /// that produced one.
    pub fn reference_snapshot(&self) -> Option<&IndicatorSnapshot> {
        self.snapshots.first()
    }
}

/// Sleeps `delay` before every call except the first.
struct Pacer {
    delay: Duration,
    primed: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self { delay, primed: false }
    }

    async fn wait(&mut self) {
        if self.primed && !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        self.primed = true;
    }
}

/// Clears the busy flag when a cycle ends, even on early return.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ScanOrchestrator {
    analyzer: TimeframeAnalyzer,
    classifier: TrendClassifier,
    exits: ExitLevelCalculator,
    state: PairStateStore,
    watch_list: WatchList,
    notifier: Arc<dyn Notifier>,
    notify_target: String,
    chart_url_template: String,
    scan: ScanConfig,
    database: Option<Database>,
    busy: AtomicBool,
}

impl ScanOrchestrator {
    pub fn new(
        config: &Config,
        provider: Arc<dyn CandleProvider>,
        notifier: Arc<dyn Notifier>,
        watch_list: WatchList,
        state: PairStateStore,
    ) -> Self {
        let scan = config.scan.clone();
        let analyzer = TimeframeAnalyzer::new(
            provider,
            config.indicators.clone(),
            scan.candle_count,
            scan.min_candles,
            scan.io_timeout(),
        );

        Self {
            analyzer,
            classifier: TrendClassifier::new(
                config.indicators.clone(),
                config.thresholds.clone(),
                config.profit.clone(),
            ),
            exits: ExitLevelCalculator::new(config.exit.clone()),
            state,
            watch_list,
            notifier,
            notify_target: config.telegram.chat_id.clone(),
            chart_url_template: config.alerts.chart_url_template.clone(),
            scan,
            database: None,
            busy: AtomicBool::new(false),
        }
    }

    /// Persist pair states after every cycle.
    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn state(&self) -> &PairStateStore {
        &self.state
    }

    pub fn watch_list(&self) -> &WatchList {
        &self.watch_list
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Analyse and classify one instrument without touching the state store.
    pub async fn analyze_instrument(&self, instrument: &str) -> BotResult<InstrumentAnalysis> {
        let mut pacer = Pacer::new(self.scan.request_delay());
        self.analyze_paced(instrument, &mut pacer).await
    }

    async fn analyze_paced(&self, instrument: &str, pacer: &mut Pacer) -> BotResult<InstrumentAnalysis> {
        let instrument = WatchList::normalize(instrument);
        if instrument.is_empty() {
            return Err(BotError::InvalidInstrument(instrument));
        }

        let mut snapshots = Vec::with_capacity(self.scan.resolutions.len());
        let mut skipped = Vec::new();

        for &resolution in &self.scan.resolutions {
            pacer.wait().await;
            match self.analyzer.analyze(&instrument, resolution).await {
                SnapshotOutcome::Ready(snapshot) => snapshots.push(snapshot),
                SnapshotOutcome::Unavailable(e) => skipped.push((resolution, e.to_string())),
                SnapshotOutcome::Insufficient { received, required } => skipped.push((
                    resolution,
                    format!("{} candles received, {} required", received, required),
                )),
            }
        }

        let trend = self.classifier.classify(&snapshots);
        debug!(
            instrument = %instrument,
            label = %trend.label,
            confidence = trend.confidence_percent,
            usable = snapshots.len(),
            "classified"
        );

        Ok(InstrumentAnalysis {
            instrument,
            snapshots,
            skipped,
            trend,
        })
    }

    /// Exit levels for an analysis; `None` when no resolution produced data.
    pub fn exit_levels(&self, analysis: &InstrumentAnalysis) -> Option<ExitLevels> {
        analysis.reference_snapshot().map(|snap| {
            self.exits.calculate(
                snap.last_close,
                snap.atr,
                analysis.trend.suggested_profit_percent,
            )
        })
    }

    /// Run one full pass over the watch list.
    pub async fn run_cycle(&self) -> CycleReport {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("⏳ Scan already in progress, skipping");
            return CycleReport::skipped();
        }
        let _guard = BusyGuard(&self.busy);

        let instruments = self.watch_list.list();
        let pruned = self.state.retain_instruments(&instruments);
        if pruned > 0 {
            debug!(pruned, "dropped state for unwatched instruments");
        }

        info!(
            "🔍 Scanning {} instruments on {} resolutions",
            instruments.len(),
            self.scan.resolutions.len()
        );

        let mut report = CycleReport {
            instruments: instruments.len(),
            ..CycleReport::default()
        };
        let mut request_pacer = Pacer::new(self.scan.request_delay());
        let mut notify_pacer = Pacer::new(self.scan.notification_delay());

        for instrument in &instruments {
            let analysis = match self.analyze_paced(instrument, &mut request_pacer).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    error!(instrument = %instrument, category = e.category(), "❌ Analysis failed: {}", e);
                    report.failures += 1;
                    continue;
                }
            };

            if analysis.snapshots.is_empty() {
                warn!(instrument = %instrument, "⚠️ No resolution produced data, recording NEUTRAL");
                report.failures += 1;
            }

            let alert_worthy = self.state.observe(&analysis.instrument, analysis.trend.label);
            report.classified += 1;

            if !alert_worthy {
                continue;
            }

            let Some(exits) = self.exit_levels(&analysis) else {
                error!(instrument = %instrument, "❌ Alert-worthy label without a snapshot");
                report.failures += 1;
                continue;
            };

            notify_pacer.wait().await;
            match self.send_alert(analysis, exits).await {
                Ok(()) => report.alerts_sent += 1,
                Err(e) => {
                    // The label stays recorded so a delivery failure does not re-alert.
                    error!(instrument = %instrument, notifier = self.notifier.name(), "📪 Notification failed: {}", e);
                    report.notification_failures += 1;
                }
            }
        }

        self.persist_state();

        info!(
            "✅ Cycle complete: {} classified, {} alerts, {} failures",
            report.classified, report.alerts_sent, report.failures
        );
        report
    }

    async fn send_alert(&self, analysis: InstrumentAnalysis, exits: ExitLevels) -> Result<(), NotifyError> {
        let links = chart_links(&self.chart_url_template, &analysis.instrument);
        let alert = TrendAlert {
            instrument: analysis.instrument,
            trend: analysis.trend,
            exits,
            snapshots: analysis.snapshots,
        };
        let message = alert.render();

        info!(
            "📣 {} {} ({:.1}%)",
            alert.trend.label, alert.instrument, alert.trend.confidence_percent
        );

        let io_timeout = self.scan.io_timeout();
        match timeout(io_timeout, self.notifier.send(&self.notify_target, &message, &links)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(io_timeout.as_secs())),
        }
    }

    fn persist_state(&self) {
        let Some(db) = &self.database else {
            return;
        };
        if let Err(e) = db.save_pair_states(&self.state.snapshot()) {
            warn!("💾 Failed to persist pair states: {}", e);
        }
    }

    /// Drive cycles from the interval timer and on-demand triggers until the
    /// trigger channel closes. The first tick fires immediately.
    pub async fn run(&self, mut triggers: mpsc::Receiver<()>) -> BotResult<()> {
        if self.watch_list.is_empty() {
            return Err(BotError::EmptyWatchList);
        }

        info!(
            "🚀 Scheduler started: every {}s via {}",
            self.scan.interval_seconds,
            self.analyzer.provider_name()
        );

        let mut ticker = interval(self.scan.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                trigger = triggers.recv() => match trigger {
                    Some(()) => {
                        info!("▶️ On-demand scan requested");
                        self.run_cycle().await;
                    }
                    None => break,
                },
            }
        }

        info!("🛑 Scheduler stopped");
        Ok(())
    }
}
