// Scan, scheduler and analysis command implementations
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use trend_signal_bot::core::alert::format_price;
use trend_signal_bot::{
    BotError, BotResult, Config, Database, KrakenClient, LogNotifier, Notifier, PairStateStore,
    ScanOrchestrator, TelegramNotifier, WatchList,
};

/// Database, watch list, restored state and clients wired into an orchestrator
fn build_orchestrator(config: &Config, dry_run: bool) -> BotResult<(ScanOrchestrator, Database)> {
    let db = Database::open(&config.database.path)?;

    let watch_list = WatchList::from_instruments(db.load_or_seed_watch_list(&config.scan.instruments)?);
    let state = PairStateStore::new();
    state.restore(db.load_pair_states()?);

    let notifier: Arc<dyn Notifier> = if dry_run {
        info!("🧪 DRY RUN mode (alerts are logged, not sent)");
        Arc::new(LogNotifier)
    } else {
        if !config.telegram.is_configured() {
            return Err(trend_signal_bot::clients::NotifyError::NotConfigured(
                "telegram bot_token and chat_id are required".to_string(),
            )
            .into());
        }
        Arc::new(TelegramNotifier::from_config(&config.telegram)?)
    };

    let provider = Arc::new(KrakenClient::from_config(&config.kraken));
    let orchestrator = ScanOrchestrator::new(config, provider, notifier, watch_list, state)
        .with_database(db.clone());

    Ok((orchestrator, db))
}

pub async fn scan_once(config: Config, dry_run: bool) -> BotResult<()> {
    let (orchestrator, _db) = build_orchestrator(&config, dry_run)?;
    if orchestrator.watch_list().is_empty() {
        return Err(BotError::EmptyWatchList);
    }

    let report = orchestrator.run_cycle().await;

    info!("");
    info!("📊 Scan summary");
    info!("   Instruments:    {}", report.instruments);
    info!("   Classified:     {}", report.classified);
    info!("   Alerts sent:    {}", report.alerts_sent);
    if report.notification_failures > 0 {
        warn!("   Send failures:  {}", report.notification_failures);
    }
    if report.failures > 0 {
        warn!("   Failures:       {}", report.failures);
    }
    Ok(())
}

pub async fn run_scheduler(config: Config, dry_run: bool) -> BotResult<()> {
    let (orchestrator, db) = build_orchestrator(&config, dry_run)?;
    let (tx, rx) = mpsc::channel(4);

    info!("⌨️  Console: scan | add <INSTRUMENT> | remove <INSTRUMENT> | list | quit");
    tokio::spawn(console(tx, orchestrator.watch_list().clone(), db));

    tokio::select! {
        result = orchestrator.run(rx) => result?,
        _ = tokio::signal::ctrl_c() => info!("🛑 Interrupted, shutting down"),
    }
    Ok(())
}

/// Reads console commands until `quit`. Dropping `triggers` stops the scheduler
/// after its current cycle.
async fn console(triggers: mpsc::Sender<()>, watch_list: WatchList, db: Database) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            // No terminal attached; keep the scheduler alive.
            Ok(None) | Err(_) => {
                std::future::pending::<()>().await;
                return;
            }
        };

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("scan"), _) => {
                if triggers.try_send(()).is_err() {
                    warn!("⏳ A scan is already queued");
                }
            }
            (Some("add"), Some(instrument)) => {
                if let Err(e) = db.add_watched(instrument) {
                    warn!("💾 Failed to store {}: {}", instrument, e);
                }
                if watch_list.add(instrument) {
                    info!("➕ Watching {}", WatchList::normalize(instrument));
                } else {
                    info!("{} is already watched", WatchList::normalize(instrument));
                }
            }
            (Some("remove"), Some(instrument)) => {
                if let Err(e) = db.remove_watched(instrument) {
                    warn!("💾 Failed to remove {}: {}", instrument, e);
                }
                if watch_list.remove(instrument) {
                    info!("➖ Stopped watching {}", WatchList::normalize(instrument));
                } else {
                    info!("{} is not watched", WatchList::normalize(instrument));
                }
            }
            (Some("list"), _) => {
                info!("👀 Watching: {}", watch_list.list().join(", "));
            }
            (Some("quit") | Some("exit"), _) => {
                info!("👋 Stopping after the current cycle");
                return;
            }
            (None, _) => {}
            (Some(other), _) => {
                warn!("Unknown command '{}'", other);
            }
        }
    }
}

pub async fn analyze(config: Config, instrument: &str) -> BotResult<()> {
    let provider = Arc::new(KrakenClient::from_config(&config.kraken));
    let orchestrator = ScanOrchestrator::new(
        &config,
        provider,
        Arc::new(LogNotifier),
        WatchList::new(),
        PairStateStore::new(),
    );

    let analysis = orchestrator.analyze_instrument(instrument).await?;

    info!("🔬 {}", analysis.instrument);
    for snap in &analysis.snapshots {
        info!(
            "   {:>4}  close {}  RSI {:.1}  MACD {:+.4}/{:+.4}  EMA {}  SMA {}",
            snap.resolution.label(),
            format_price(snap.last_close),
            snap.rsi,
            snap.macd.macd,
            snap.macd.histogram,
            format_price(snap.ema),
            format_price(snap.sma),
        );
        info!(
            "         BB {} / {} / {}  ATR {}  %K {:.1}  %D {:.1}",
            format_price(snap.bollinger.lower),
            format_price(snap.bollinger.middle),
            format_price(snap.bollinger.upper),
            format_price(snap.atr),
            snap.stochastic.k,
            snap.stochastic.d,
        );
    }
    for (resolution, reason) in &analysis.skipped {
        warn!("   {:>4}  skipped: {}", resolution.label(), reason);
    }

    info!(
        "🏷️  {} ({:.1}% confidence, +{:.1}% target)",
        analysis.trend.label, analysis.trend.confidence_percent, analysis.trend.suggested_profit_percent
    );

    if let Some(exits) = orchestrator.exit_levels(&analysis) {
        info!(
            "   Stop {}  Take profit {}  Trailing {}  R:R {}",
            format_price(exits.stop_loss),
            format_price(exits.take_profit),
            format_price(exits.trailing_stop),
            format_price(exits.reward_target),
        );
    }
    Ok(())
}
